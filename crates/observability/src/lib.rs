//! Tracing/logging setup shared by binaries and black-box tests.

/// Tracing configuration (filters, layers, file sinks).
pub mod tracing;

pub use crate::tracing::{LogGuard, LogOptions};

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls become no-ops. Keep the
/// returned guard alive for as long as file logs should be flushed.
pub fn init(options: &LogOptions) -> LogGuard {
    crate::tracing::init(options)
}

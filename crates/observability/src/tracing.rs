//! Tracing/logging initialization.
//!
//! Console output plus, when a log directory is configured, daily-rolling
//! files: everything under `AllLogs/`, with information, warnings and errors
//! also split into their own folders.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Folder under the log directory and the lowest level written there.
const FILE_SINKS: [(&str, LevelFilter); 4] = [
    ("AllLogs", LevelFilter::TRACE),
    ("Information", LevelFilter::INFO),
    ("Warning", LevelFilter::WARN),
    ("Error", LevelFilter::ERROR),
];

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Root of the rolling log files; `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    /// JSON console output instead of the human-readable format.
    pub json: bool,
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_dir: None,
            json: false,
            default_filter: "info".to_string(),
        }
    }
}

impl LogOptions {
    /// Console plus files under `<base_dir>/Logs`.
    pub fn with_files_under(base_dir: &Path) -> Self {
        Self {
            log_dir: Some(base_dir.join("Logs")),
            ..Self::default()
        }
    }
}

/// Keeps the non-blocking file writers flushing. Drop it at shutdown.
#[must_use]
pub struct LogGuard {
    _workers: Vec<WorkerGuard>,
}

pub fn init(options: &LogOptions) -> LogGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(options.json)];
    let mut workers = Vec::new();

    if let Some(dir) = &options.log_dir {
        for (folder, min_level) in FILE_SINKS {
            let (layer, guard) = file_layer(dir, folder, min_level);
            layers.push(layer);
            workers.push(guard);
        }
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();

    LogGuard { _workers: workers }
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_timer(fmt::time::SystemTime)
            .with_target(false)
            .boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    }
}

fn file_layer(dir: &Path, folder: &str, min_level: LevelFilter) -> (BoxedLayer, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir.join(folder), "log.txt");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(min_level)
        .boxed();
    (layer, guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_logs() {
        let opts = LogOptions::with_files_under(Path::new("/srv/app"));
        assert_eq!(opts.log_dir, Some(PathBuf::from("/srv/app/Logs")));
        assert_eq!(opts.default_filter, "info");
    }

    #[test]
    fn one_sink_per_level_folder() {
        let folders: Vec<_> = FILE_SINKS.iter().map(|(folder, _)| *folder).collect();
        assert_eq!(folders, ["AllLogs", "Information", "Warning", "Error"]);
        assert!(FILE_SINKS.contains(&("Information", LevelFilter::INFO)));
    }

    #[test]
    fn init_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let opts = LogOptions::with_files_under(dir.path());
        let _first = init(&opts);
        let _second = init(&opts);
        ::tracing::warn!("written once the writer flushes");
    }
}

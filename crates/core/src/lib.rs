//! `flashweb-core`: shared identifiers, credential value objects and errors.
//!
//! No IO lives here.

pub mod credentials;
pub mod error;
pub mod id;

pub use credentials::{Password, Username};
pub use error::{DomainError, DomainResult};
pub use id::{SessionId, UserId};

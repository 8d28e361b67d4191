//! Shared types and error hierarchy for Sift.

pub mod auth;
pub mod error;
pub mod event;
pub mod options;
pub mod result;
pub mod transport;

pub use auth::Credential;
pub use error::{ApiError, ConfigError};
pub use event::{Event, Payload};
pub use options::{ErrorPolicy, SearchOptions};
pub use result::*;

//! Utility modules for error handling and configuration

pub mod config;
pub mod error;

// Re-export for convenience
pub use config::{Endpoints, MinSizes, Settings, Tokens};
pub use error::{ExtractionFailure, MalformedIdError, ReelfetchError};

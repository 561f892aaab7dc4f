//! Error handling for the `Nearfield` library.

mod sbvh;
mod sbvh_config;

pub use sbvh::SbvhError;
pub use sbvh_config::SbvhConfigError;

use std::io;
use thiserror::Error;

/// Main error type for this library.
#[derive(Error, Debug)]
pub enum NearfieldError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Construction error: {0}")]
    Construction(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the proximity-query library.
pub type Result<T> = std::result::Result<T, NearfieldError>;

impl From<SbvhError> for NearfieldError {
    fn from(err: SbvhError) -> Self {
        NearfieldError::Construction(err.to_string())
    }
}

impl From<SbvhConfigError> for NearfieldError {
    fn from(err: SbvhConfigError) -> Self {
        NearfieldError::InvalidConfiguration(err.to_string())
    }
}

//! Check-in service error types

use std::time::Duration;
use thiserror::Error;

use shared::SharedError;

#[derive(Error, Debug)]
pub enum CheckinError {
    #[error("Batch size {size} exceeds max of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Roster service error: {message}")]
    Gateway { message: String },

    #[error("Roster request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Print failed: {message}")]
    PrintFailed { message: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Configuration error: {field} - {message}")]
    Config { field: String, message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckinError {
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    pub fn print(message: impl Into<String>) -> Self {
        Self::PrintFailed {
            message: message.into(),
        }
    }

    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type CheckinResult<T> = Result<T, CheckinError>;

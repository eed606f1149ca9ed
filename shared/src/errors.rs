//! Shared error types for the check-in kiosk backend

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid {kind} id: {input}")]
    InvalidId { kind: &'static str, input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;

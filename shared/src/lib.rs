//! Shared types for the check-in kiosk backend
//!
//! Contains the roster identifiers, check-in request/response records and
//! label content that cross the boundary between the kiosk core and the
//! routing layer that exposes it.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;

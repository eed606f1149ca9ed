//! Check-in kiosk backend
//!
//! Short check-in codes, label layout, and concurrent batch check-in against
//! the Breeze roster with one print job per batch.

pub mod codes;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;

pub use codes::{CheckinCode, CodeError, DecodedCode, decode, encode, validate};
pub use config::KioskConfig;
pub use crate::core::{CheckinService, LabelLayout, Layout, MAX_BATCH_SIZE, PrintBatch, RenderedPage, compose_labels};
pub use error::{CheckinError, CheckinResult};
pub use services::{BreezeClient, CupsPrintSink};
pub use traits::{AttendanceGateway, LabelRenderer, PrintSink, RosterDirectory};

/// The service wired to its production adapters
pub type KioskService = CheckinService<BreezeClient, LabelLayout, CupsPrintSink>;

/// Build the production service from configuration
pub fn build_service(config: &KioskConfig) -> CheckinResult<KioskService> {
    Ok(CheckinService::new(
        BreezeClient::from_config(config)?,
        LabelLayout::new(),
        CupsPrintSink::from_config(config),
    )
    .with_call_timeout(config.attendance_timeout))
}

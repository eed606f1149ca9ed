//! Core check-in logic: batch orchestration, label composition and layout

pub mod batch;
pub mod labels;
pub mod layout;

pub use batch::{CheckinService, DEFAULT_CALL_TIMEOUT, MAX_BATCH_SIZE, REFUSED_MESSAGE, validate_batch_size};
pub use labels::{PrintBatch, compose_labels};
pub use layout::{DrawOp, Font, HelveticaMetrics, LabelLayout, Layout, RenderedPage, TextExtent, TextMetrics, label_timestamp};

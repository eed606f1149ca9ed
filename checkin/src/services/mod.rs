//! Concrete adapters for the collaborator traits

pub mod breeze;
pub mod postscript;
pub mod printer;

pub use breeze::{BreezeClient, is_truthy, normalize_family};
pub use postscript::encode_document;
pub use printer::CupsPrintSink;

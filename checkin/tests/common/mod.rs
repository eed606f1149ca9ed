//! Common test utilities and infrastructure
//!
//! Shared fixtures and hand-written collaborator fakes used across the
//! check-in integration suites.
#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{Answer, FakeGateway, RecordingSink, TestHelpers};

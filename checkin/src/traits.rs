//! Collaborator trait definitions with mockall annotations for testing
//!
//! The roster service, the label renderer and the print spooler are reached
//! only through these traits. Concrete adapters live in [`crate::services`]
//! and are constructed once by the caller, then injected into
//! [`crate::core::CheckinService`].

use async_trait::async_trait;
use serde_json::Value;

use shared::{FamilyMember, InstanceId, LabelContent, PersonId};

use crate::core::layout::{Layout, RenderedPage};
use crate::error::CheckinResult;

/// Attendance reads and writes against the remote roster system
#[mockall::automock]
#[async_trait]
pub trait AttendanceGateway: Send + Sync {
    /// Check a person in to an event instance
    ///
    /// # Returns
    /// `true` only when the roster answered with `true` or `"true"`
    async fn add_attendance(&self, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool>;

    /// Check a person out of an event instance
    async fn remove_attendance(&self, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool>;

    /// List who is checked in to an event instance
    async fn list_attendance(&self, instance_id: InstanceId) -> CheckinResult<Vec<Value>>;

    /// People eligible for check-in at an event instance
    async fn eligible_people(&self, instance_id: InstanceId) -> CheckinResult<Vec<Value>>;
}

/// Read-only roster lookups used by the kiosk front end
#[mockall::automock]
#[async_trait]
pub trait RosterDirectory: Send + Sync {
    /// Events, optionally filtered by an ISO date range
    async fn events(&self, start: Option<String>, end: Option<String>) -> CheckinResult<Vec<Value>>;

    /// Scheduled instances of one event
    async fn event_instances(&self, event_id: &str) -> CheckinResult<Vec<Value>>;

    /// Full details for one person
    async fn person(&self, person_id: PersonId) -> CheckinResult<Value>;

    /// Family members of a person, flattened
    async fn family(&self, person_id: PersonId) -> CheckinResult<Vec<FamilyMember>>;

    /// A person record with its raw family list attached under `family`
    async fn person_with_family(&self, person_id: PersonId) -> CheckinResult<Value>;

    /// Search people by name
    async fn search_people(&self, query: &str) -> CheckinResult<Vec<Value>>;
}

/// Turns label content into one fixed-size page
#[mockall::automock]
pub trait LabelRenderer: Send + Sync {
    fn render(&self, content: &LabelContent, timestamp: &str, layout: Layout) -> RenderedPage;
}

/// Physical print spooler
#[mockall::automock]
#[async_trait]
pub trait PrintSink: Send + Sync {
    /// Submit all pages as a single job
    ///
    /// Any temporary artifact created for the job is removed whether or not
    /// the spooler accepts it.
    async fn submit(&self, pages: &[RenderedPage]) -> CheckinResult<()>;

    /// Whether the configured printer is reachable
    async fn is_connected(&self) -> bool;
}

//! Batch check-in orchestration
//!
//! The service writes attendance for every person in a batch concurrently,
//! keeps one outcome per person in request order, and prints labels for the
//! people whose check-in went through as one spooler job. Remote failures
//! are reported per person, and a failed print only zeroes
//! `labels_printed`. The only request rejected outright is an oversized batch.

use chrono::Local;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use serde_json::Value;
use shared::logging::Component;
use shared::{
    BatchCheckinRequest, BatchCheckinResponse, CheckinOutcome, CheckinPerson, InstanceId, LabelContent,
    PersonId, checkin_debug, checkin_info, checkin_warn,
};

use crate::core::labels::PrintBatch;
use crate::core::layout::label_timestamp;
use crate::error::{CheckinError, CheckinResult};
use crate::traits::{AttendanceGateway, LabelRenderer, PrintSink};

/// Largest batch accepted in one request
///
/// The roster service allows roughly 20 calls per minute; 15 leaves room for
/// lookups made by the kiosk in the same minute.
pub const MAX_BATCH_SIZE: usize = 15;

/// Default bound on a single attendance call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Error text recorded when the roster answers an attendance write with
/// anything other than `true`
pub const REFUSED_MESSAGE: &str = "Failed";

/// Reject a batch larger than [`MAX_BATCH_SIZE`]
pub fn validate_batch_size(size: usize) -> CheckinResult<()> {
    if size > MAX_BATCH_SIZE {
        return Err(CheckinError::BatchTooLarge {
            size,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

/// Check-in service with dependency injection
pub struct CheckinService<G, R, P>
where
    G: AttendanceGateway,
    R: LabelRenderer,
    P: PrintSink,
{
    gateway: G,
    renderer: R,
    printer: P,
    call_timeout: Duration,
}

impl<G, R, P> CheckinService<G, R, P>
where
    G: AttendanceGateway,
    R: LabelRenderer,
    P: PrintSink,
{
    /// Create a new service around already constructed collaborators
    pub fn new(gateway: G, renderer: R, printer: P) -> Self {
        Self {
            gateway,
            renderer,
            printer,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Configure the per-call attendance timeout (fluent API)
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> CheckinResult<T>
    where
        F: Future<Output = CheckinResult<T>>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| CheckinError::Timeout {
                operation: operation.to_string(),
                timeout: self.call_timeout,
            })?
    }

    /// Check in a single person
    ///
    /// `Ok(false)` means the roster refused the write; `Err` means it could
    /// not be reached or answered with an error status.
    pub async fn check_in(&self, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool> {
        self.bounded("attendance add", self.gateway.add_attendance(instance_id, person_id))
            .await
    }

    /// Check out a single person
    pub async fn check_out(&self, instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool> {
        self.bounded("attendance delete", self.gateway.remove_attendance(instance_id, person_id))
            .await
    }

    /// People eligible for check-in at an instance
    pub async fn eligible_people(&self, instance_id: InstanceId) -> CheckinResult<Vec<Value>> {
        self.bounded("eligible people", self.gateway.eligible_people(instance_id))
            .await
    }

    /// People currently checked in to an instance
    pub async fn attendance(&self, instance_id: InstanceId) -> CheckinResult<Vec<Value>> {
        self.bounded("attendance list", self.gateway.list_attendance(instance_id))
            .await
    }

    async fn check_in_one(&self, instance_id: InstanceId, person: &CheckinPerson) -> CheckinOutcome {
        match self.check_in(instance_id, person.person_id).await {
            Ok(true) => CheckinOutcome::succeeded(person.person_id),
            Ok(false) => CheckinOutcome::failed(person.person_id, REFUSED_MESSAGE),
            Err(e) => {
                checkin_warn!(Component::Batch, person_id = %person.person_id, "Check-in failed: {}", e);
                CheckinOutcome::failed(person.person_id, e.to_string())
            }
        }
    }

    /// Check in a batch of people and print their labels as one job
    pub async fn batch_check_in(&self, request: &BatchCheckinRequest) -> CheckinResult<BatchCheckinResponse> {
        validate_batch_size(request.people.len())?;

        let span = tracing::info_span!(
            "batch_checkin",
            batch_id = %Uuid::new_v4(),
            instance_id = %request.instance_id,
            size = request.people.len(),
        );

        async move {
            // join_all yields results in input order regardless of completion order
            let results: Vec<CheckinOutcome> = join_all(
                request
                    .people
                    .iter()
                    .map(|person| self.check_in_one(request.instance_id, person)),
            )
            .await;

            let succeeded = results.iter().filter(|outcome| outcome.success).count();
            checkin_info!(
                Component::Batch,
                "📋 Checked in {}/{} people",
                succeeded,
                results.len()
            );

            let labels_printed = if request.print_labels {
                let batch = PrintBatch::from_outcomes(&request.people, &results, &request.extra_labels);
                self.print_quietly(&batch).await
            } else {
                checkin_debug!(Component::Batch, "Label printing disabled for this batch");
                0
            };

            Ok(BatchCheckinResponse {
                results,
                labels_printed,
            })
        }
        .instrument(span)
        .await
    }

    /// Print and report the number of labels printed, 0 on failure
    async fn print_quietly(&self, batch: &PrintBatch) -> usize {
        if batch.is_empty() {
            return 0;
        }

        match self.submit(batch).await {
            Ok(()) => batch.len(),
            Err(e) => {
                checkin_warn!(Component::Printer, "Label print failed: {}", e);
                0
            }
        }
    }

    /// Print an arbitrary set of labels as one job
    pub async fn print_labels(&self, labels: Vec<LabelContent>) -> CheckinResult<usize> {
        let batch = PrintBatch::new(labels);
        if batch.is_empty() {
            return Err(CheckinError::print("no labels to print"));
        }

        self.submit(&batch).await?;
        Ok(batch.len())
    }

    async fn submit(&self, batch: &PrintBatch) -> CheckinResult<()> {
        let timestamp = label_timestamp(&Local::now());
        let pages = batch.render(&self.renderer, &timestamp);
        checkin_debug!(Component::Printer, "Submitting {} label pages", pages.len());
        self.printer.submit(&pages).await
    }
}

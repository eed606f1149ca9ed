//! Hand-written collaborator fakes
//!
//! Mocks verify calls; these fakes add controllable latency so tests can
//! observe concurrency, ordering and timeouts under paused tokio time.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use checkin::core::layout::RenderedPage;
use checkin::{AttendanceGateway, CheckinError, CheckinResult, CheckinService, LabelLayout, PrintSink};
use shared::{InstanceId, PersonId};

/// How the fake roster answers one attendance write
#[derive(Clone, Debug)]
pub enum Answer {
    Accept,
    Refuse,
    Fail(String),
    Hang,
}

/// Attendance gateway with a scripted answer and delay per person
#[derive(Default)]
pub struct FakeGateway {
    script: HashMap<PersonId, (Duration, Answer)>,
    calls: Mutex<Vec<PersonId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, person_id: u64, delay: Duration, answer: Answer) -> Self {
        self.script.insert(PersonId::new(person_id), (delay, answer));
        self
    }

    /// Person ids in the order their calls started
    pub fn calls(&self) -> Vec<PersonId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttendanceGateway for FakeGateway {
    async fn add_attendance(&self, _instance_id: InstanceId, person_id: PersonId) -> CheckinResult<bool> {
        self.calls.lock().unwrap().push(person_id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, answer) = self
            .script
            .get(&person_id)
            .cloned()
            .unwrap_or((Duration::ZERO, Answer::Accept));
        tokio::time::sleep(delay).await;
        if matches!(answer, Answer::Hang) {
            std::future::pending::<()>().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match answer {
            Answer::Accept => Ok(true),
            Answer::Refuse => Ok(false),
            Answer::Fail(message) => Err(CheckinError::gateway(message)),
            Answer::Hang => unreachable!(),
        }
    }

    async fn remove_attendance(&self, _instance_id: InstanceId, _person_id: PersonId) -> CheckinResult<bool> {
        Ok(true)
    }

    async fn list_attendance(&self, _instance_id: InstanceId) -> CheckinResult<Vec<Value>> {
        Ok(vec![])
    }

    async fn eligible_people(&self, _instance_id: InstanceId) -> CheckinResult<Vec<Value>> {
        Ok(vec![])
    }
}

/// Print sink that keeps every submitted job
#[derive(Default)]
pub struct RecordingSink {
    jobs: Mutex<Vec<Vec<RenderedPage>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<Vec<RenderedPage>> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrintSink for RecordingSink {
    async fn submit(&self, pages: &[RenderedPage]) -> CheckinResult<()> {
        self.jobs.lock().unwrap().push(pages.to_vec());
        if self.fail {
            return Err(CheckinError::print("printer out of labels"));
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        !self.fail
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Service over the fakes with the production layout engine
    pub fn service<G: AttendanceGateway>(gateway: G, sink: RecordingSink) -> CheckinService<G, LabelLayout, RecordingSink> {
        CheckinService::new(gateway, LabelLayout::new(), sink)
    }

    /// Texts drawn on each page of a job, in page order
    pub fn page_texts(job: &[RenderedPage]) -> Vec<Vec<String>> {
        job.iter()
            .map(|page| page.texts().into_iter().map(str::to_string).collect())
            .collect()
    }
}

//! Label composition for a check-in batch

use std::collections::HashSet;

use shared::{CheckinOutcome, CheckinPerson, LabelContent, PersonId};

use crate::core::layout::{Layout, RenderedPage};
use crate::traits::LabelRenderer;

/// Labels to print for a batch, in print order
///
/// One label per person whose check-in succeeded (matched by person id, in
/// request order), followed by the extra labels exactly as given. Extra
/// labels are parent tear-offs and are printed regardless of outcomes.
pub fn compose_labels(
    people: &[CheckinPerson],
    outcomes: &[CheckinOutcome],
    extra_labels: &[LabelContent],
) -> Vec<LabelContent> {
    let succeeded: HashSet<PersonId> = outcomes
        .iter()
        .filter(|outcome| outcome.success)
        .map(|outcome| outcome.person_id)
        .collect();

    people
        .iter()
        .filter(|person| succeeded.contains(&person.person_id))
        .map(CheckinPerson::label)
        .chain(extra_labels.iter().cloned())
        .collect()
}

/// An ordered set of labels printed together as one spooler job
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrintBatch {
    labels: Vec<LabelContent>,
}

impl PrintBatch {
    pub fn new(labels: Vec<LabelContent>) -> Self {
        Self { labels }
    }

    pub fn from_outcomes(
        people: &[CheckinPerson],
        outcomes: &[CheckinOutcome],
        extra_labels: &[LabelContent],
    ) -> Self {
        Self::new(compose_labels(people, outcomes, extra_labels))
    }

    pub fn labels(&self) -> &[LabelContent] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Render one page per label, each with the layout its content calls for
    pub fn render<R>(&self, renderer: &R, timestamp: &str) -> Vec<RenderedPage>
    where
        R: LabelRenderer + ?Sized,
    {
        self.labels
            .iter()
            .map(|label| renderer.render(label, timestamp, Layout::for_content(label)))
            .collect()
    }
}

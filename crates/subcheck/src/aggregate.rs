use crate::model::{ProbeOutcome, ProbeStatus, ResultSet};
use futures::{Stream, StreamExt};
use serde::Serialize;

/// Per-status counts of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeSummary {
    pub reachable: usize,
    pub unreachable: usize,
    pub errors: usize,
}

impl ProbeSummary {
    pub fn total(&self) -> usize {
        self.reachable + self.unreachable + self.errors
    }

    fn record(&mut self, status: &ProbeStatus) {
        match status {
            ProbeStatus::Reachable => self.reachable += 1,
            ProbeStatus::Unreachable(_) => self.unreachable += 1,
            ProbeStatus::Error(_) => self.errors += 1,
        }
    }
}

/// Drains the outcome stream and keeps the reachable candidates, sorted and deduplicated.
pub async fn aggregate<S>(host: &str, outcomes: S) -> (ResultSet, ProbeSummary)
where
    S: Stream<Item = ProbeOutcome>,
{
    let outcomes: Vec<ProbeOutcome> = outcomes.collect().await;
    from_outcomes(host, outcomes)
}

pub fn from_outcomes<I>(host: &str, outcomes: I) -> (ResultSet, ProbeSummary)
where
    I: IntoIterator<Item = ProbeOutcome>,
{
    let mut summary = ProbeSummary::default();
    let reachable: Vec<_> = outcomes
        .into_iter()
        .inspect(|outcome| summary.record(&outcome.status))
        .filter(ProbeOutcome::is_reachable)
        .map(|outcome| outcome.candidate)
        .collect();

    (ResultSet::new(host, reachable), summary)
}

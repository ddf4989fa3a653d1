use crate::aggregate::{aggregate, ProbeSummary};
use crate::collector::Collector;
use crate::config::RunConfig;
use crate::model::{Candidate, ProbeOutcome, ResultSet};
use crate::pool::WorkerPool;
use crate::probe::Prober;
use crate::sources::CandidateSource;
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Enumerating,
    Probing,
    Aggregating,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub result: ResultSet,
    pub summary: ProbeSummary,
    /// Candidates handed to the workers, after the candidate limit.
    pub emitted: usize,
}

pub struct Pipeline {
    host: String,
    config: RunConfig,
    source: Box<dyn CandidateSource>,
    prober: Arc<dyn Prober>,
    state: PipelineState,
}

// region:        --- Constructors

impl Pipeline {
    pub fn new(
        host: &str,
        config: RunConfig,
        source: Box<dyn CandidateSource>,
        prober: Arc<dyn Prober>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            host: host.to_string(),
            config,
            source,
            prober,
            state: PipelineState::Idle,
        })
    }
}

// endregion:     --- Constructors

impl Pipeline {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        info!("{:12} - {:?} -> {:?}", "STATE", self.state, next);
        self.state = next;
    }

    #[instrument(name = "pipeline", level = "info", fields(host = %self.host), skip_all)]
    pub async fn run(&mut self) -> Result<RunReport> {
        self.transition(PipelineState::Enumerating);
        debug!("Source: {}", self.source.description());

        let candidates = match self.source.enumerate().await {
            Ok(candidates) => limit(candidates, self.config.candidate_limit),
            Err(err) => {
                error!("{}: {}", self.source.name(), err);
                self.transition(PipelineState::Failed);
                return Err(err);
            }
        };
        let emitted = candidates.len();
        info!("Found {} candidates", emitted);

        if !self.source.requires_probe() {
            self.transition(PipelineState::Aggregating);
            let result = ResultSet::from_listed(&self.host, candidates);
            let summary = ProbeSummary {
                reachable: result.len(),
                ..Default::default()
            };
            self.transition(PipelineState::Done);
            return Ok(RunReport {
                result,
                summary,
                emitted,
            });
        }

        self.transition(PipelineState::Probing);
        let (outcomes, watcher) =
            probe_candidates(&self.config, Arc::clone(&self.prober), candidates);
        if let Err(err) = watcher.await {
            self.transition(PipelineState::Failed);
            return Err(err.into());
        }

        self.transition(PipelineState::Aggregating);
        let (result, summary) = aggregate(&self.host, outcomes).await;
        info!(
            "{} reachable, {} unreachable, {} errors",
            summary.reachable, summary.unreachable, summary.errors
        );

        self.transition(PipelineState::Done);
        Ok(RunReport {
            result,
            summary,
            emitted,
        })
    }
}

/// Feeds the candidates to a fresh worker pool and returns the collected outcome stream,
/// along with the completion watcher.
///
/// The results channel holds every outcome, so workers never wait on the consumer.
pub fn probe_candidates(
    config: &RunConfig,
    prober: Arc<dyn Prober>,
    candidates: Vec<Candidate>,
) -> (ReceiverStream<ProbeOutcome>, JoinHandle<usize>) {
    let (candidates_tx, candidates_rx) = mpsc::channel(config.concurrency);
    let (results_tx, results_rx) = mpsc::channel(candidates.len().max(1));

    tokio::spawn(async move {
        for candidate in candidates {
            if candidates_tx.send(candidate).await.is_err() {
                error!("Candidate channel closed before the end of the source");
                break;
            }
        }
    });

    let pool = WorkerPool::spawn(config.concurrency, prober, candidates_rx, results_tx.clone());
    Collector::watch(pool, results_tx, results_rx).into_parts()
}

fn limit(mut candidates: Vec<Candidate>, candidate_limit: Option<usize>) -> Vec<Candidate> {
    if let Some(max) = candidate_limit {
        candidates.truncate(max);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProbeStatus;
    use crate::probe::HttpProber;
    use crate::sources::fixed::Fixed;
    use crate::sources::list::ListFile;
    use crate::Error;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::HashSet;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers from a fixed set of live names, with a name dependent delay to shuffle
    /// arrival order.
    struct FakeProber {
        live: HashSet<String>,
        calls: AtomicUsize,
    }

    impl FakeProber {
        fn new(live: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                live: live.iter().map(|name| name.to_string()).collect(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, candidate: Candidate) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = (candidate.as_str().bytes().map(u64::from).sum::<u64>() % 7) * 3;
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.live.contains(candidate.as_str()) {
                ProbeOutcome::reachable(candidate)
            } else {
                ProbeOutcome::unreachable(candidate, "refused")
            }
        }
    }

    fn config(concurrency: usize) -> RunConfig {
        RunConfig {
            concurrency,
            ..Default::default()
        }
    }

    fn names(result: &ResultSet) -> Vec<&str> {
        result.candidates.iter().map(Candidate::as_str).collect()
    }

    fn hosts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("h{i}.example.com")).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn end_to_end_output_is_sorted() {
        let prober = FakeProber::new(&["b.example.com", "a.example.com"]);
        let source = Fixed::new(&["b.example.com", "a.example.com"]);
        let mut pipeline =
            Pipeline::new("example.com", config(20), Box::new(source), prober.clone()).unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(vec!["a.example.com", "b.example.com"], names(&report.result));
        assert_eq!("example.com", report.result.host);
        assert_eq!(PipelineState::Done, pipeline.state());
        assert_eq!(2, prober.calls());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn no_outcome_is_lost_for_any_concurrency() {
        let all = hosts(10);
        let names_ref: Vec<&str> = all.iter().map(String::as_str).collect();

        for concurrency in [1, 3, 10, 50] {
            let prober = FakeProber::new(&names_ref[..4]);
            let (outcomes, watcher) = probe_candidates(
                &config(concurrency),
                prober.clone(),
                Fixed::new(&names_ref).enumerate().await.unwrap(),
            );

            let outcomes: Vec<ProbeOutcome> = outcomes.collect().await;
            let distinct: HashSet<&str> =
                outcomes.iter().map(|o| o.candidate.as_str()).collect();

            assert_eq!(10, outcomes.len(), "concurrency {concurrency}");
            assert_eq!(10, distinct.len(), "concurrency {concurrency}");
            assert_eq!(10, watcher.await.unwrap());
            assert_eq!(10, prober.calls());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn ordering_does_not_depend_on_timing() {
        let all = hosts(30);
        let names_ref: Vec<&str> = all.iter().map(String::as_str).collect();
        let mut reversed = names_ref.clone();
        reversed.reverse();

        let mut results = Vec::new();
        for (order, concurrency) in [(&names_ref, 1), (&reversed, 7), (&names_ref, 30)] {
            let prober = FakeProber::new(&names_ref[10..]);
            let mut pipeline = Pipeline::new(
                "example.com",
                config(concurrency),
                Box::new(Fixed::new(order)),
                prober,
            )
            .unwrap();
            results.push(pipeline.run().await.unwrap().result);
        }

        assert_eq!(20, results[0].len());
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], results[2]);
    }

    #[tokio::test]
    async fn source_failure_aborts_before_probing() {
        let prober = FakeProber::new(&[]);
        let source = ListFile::new("/nonexistent/subcheck/list.txt");
        let mut pipeline =
            Pipeline::new("example.com", config(4), Box::new(source), prober.clone()).unwrap();

        let res = pipeline.run().await;

        assert!(matches!(res, Err(Error::Io(_))));
        assert_eq!(PipelineState::Failed, pipeline.state());
        assert_eq!(0, prober.calls());
    }

    #[tokio::test]
    async fn listed_candidates_bypass_probing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "y.example.com\n\nx.example.com\ny.example.com\n").unwrap();
        let prober = FakeProber::new(&[]);
        let mut pipeline = Pipeline::new(
            "example.com",
            config(4),
            Box::new(ListFile::new(file.path())),
            prober.clone(),
        )
        .unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(vec!["x.example.com", "y.example.com"], names(&report.result));
        assert_eq!(0, prober.calls());
        assert_eq!(PipelineState::Done, pipeline.state());
    }

    #[tokio::test]
    async fn empty_source_gives_an_empty_result() {
        let prober = FakeProber::new(&[]);
        let mut pipeline =
            Pipeline::new("example.com", config(8), Box::new(Fixed::new(&[])), prober.clone())
                .unwrap();

        let report = pipeline.run().await.unwrap();

        assert!(report.result.is_empty());
        assert_eq!(0, report.emitted);
        assert_eq!(0, prober.calls());
        assert_eq!(PipelineState::Done, pipeline.state());
    }

    #[tokio::test]
    async fn candidate_limit_caps_emission() {
        let prober = FakeProber::new(&["a.example.com", "b.example.com", "c.example.com"]);
        let config = RunConfig {
            candidate_limit: Some(2),
            ..config(4)
        };
        let source = Fixed::new(&["a.example.com", "b.example.com", "c.example.com"]);
        let mut pipeline =
            Pipeline::new("example.com", config, Box::new(source), prober.clone()).unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(2, report.emitted);
        assert_eq!(2, report.summary.total());
        assert_eq!(2, prober.calls());
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let res = Pipeline::new(
            "example.com",
            config(0),
            Box::new(Fixed::test_domains()),
            FakeProber::new(&[]),
        );

        assert!(matches!(res, Err(Error::Configuration(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn probes_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_addr = closed.local_addr().unwrap().to_string();
        drop(closed);

        let live = server.host_with_port();
        let config = RunConfig {
            concurrency: 2,
            timeout: Duration::from_millis(1500),
            candidate_limit: None,
        };
        let prober = Arc::new(HttpProber::for_hosts(config.timeout).unwrap());
        let source = Fixed::new(&[closed_addr.as_str(), live.as_str()]);
        let mut pipeline = Pipeline::new("127.0.0.1", config, Box::new(source), prober).unwrap();

        let report = pipeline.run().await.unwrap();

        assert_eq!(vec![live.as_str()], names(&report.result));
        assert_eq!(1, report.summary.unreachable);
        assert_eq!(0, report.summary.errors);
    }

    #[test]
    fn unreachable_is_not_an_error_status() {
        let outcome = ProbeOutcome::unreachable(Candidate::new("a.b").unwrap(), "refused");
        assert!(!outcome.is_reachable());
        assert!(matches!(outcome.status, ProbeStatus::Unreachable(_)));
    }
}

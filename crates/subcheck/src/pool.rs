use crate::model::{Candidate, ProbeOutcome, ProbeStatus};
use crate::probe::Prober;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Fixed set of probing workers draining one shared candidate channel.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<usize>>,
}

impl WorkerPool {
    /// Spawns exactly `concurrency` workers, whatever the number of candidates.
    pub fn spawn(
        concurrency: usize,
        prober: Arc<dyn Prober>,
        candidates: mpsc::Receiver<Candidate>,
        results: mpsc::Sender<ProbeOutcome>,
    ) -> Self {
        let candidates = Arc::new(Mutex::new(candidates));

        info!("Launching {} workers", concurrency);
        let workers = (0..concurrency)
            .map(|id| {
                let candidates = Arc::clone(&candidates);
                let prober = Arc::clone(&prober);
                let results = results.clone();
                tokio::spawn(worker(id, prober, candidates, results))
            })
            .collect();

        Self { workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Resolves once every worker has exited, returns the number of probes made.
    pub async fn join(self) -> usize {
        join_all(self.workers)
            .await
            .into_iter()
            .enumerate()
            .map(|(id, res)| match res {
                Ok(probed) => probed,
                Err(err) => {
                    error!("Worker {} aborted. Reason: {}", id, err);
                    0
                }
            })
            .sum()
    }
}

async fn worker(
    id: usize,
    prober: Arc<dyn Prober>,
    candidates: Arc<Mutex<mpsc::Receiver<Candidate>>>,
    results: mpsc::Sender<ProbeOutcome>,
) -> usize {
    let mut probed = 0;
    loop {
        // the lock is only held while waiting for the next candidate
        let next = candidates.lock().await.recv().await;
        let Some(candidate) = next else {
            break;
        };

        let outcome = prober.probe(candidate).await;
        probed += 1;
        log_outcome(&outcome);

        if results.send(outcome).await.is_err() {
            error!("Worker {}: results channel closed early", id);
            break;
        }
    }

    debug!("Worker {} finalized after {} probes", id, probed);
    probed
}

fn log_outcome(outcome: &ProbeOutcome) {
    match &outcome.status {
        ProbeStatus::Reachable => info!("{:12} - {}", "OK", outcome.candidate),
        ProbeStatus::Unreachable(reason) => {
            debug!("{:12} - {} ({})", "NO", outcome.candidate, reason)
        }
        ProbeStatus::Error(err) => warn!("{:12} - {}: {}", "ERROR", outcome.candidate, err),
    }
}

use crate::model::ProbeOutcome;
use crate::pool::WorkerPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Fan-in of the worker outcomes.
///
/// The watcher keeps the original results sender and drops it only once the pool has
/// joined, so the stream ends after the last in-flight outcome has been delivered.
#[derive(Debug)]
pub struct Collector {
    results: mpsc::Receiver<ProbeOutcome>,
    watcher: JoinHandle<usize>,
}

impl Collector {
    pub fn watch(
        pool: WorkerPool,
        results_tx: mpsc::Sender<ProbeOutcome>,
        results_rx: mpsc::Receiver<ProbeOutcome>,
    ) -> Self {
        let watcher = tokio::spawn(async move {
            debug!("Waiting pool of {} workers", pool.size());
            let probed = pool.join().await;
            info!("{} candidates probed", probed);
            drop(results_tx);
            probed
        });

        Self {
            results: results_rx,
            watcher,
        }
    }

    /// Splits the collector into its stream and the watcher handle, which yields the
    /// number of probes made once the pool is done.
    pub fn into_parts(self) -> (ReceiverStream<ProbeOutcome>, JoinHandle<usize>) {
        (ReceiverStream::new(self.results), self.watcher)
    }
}

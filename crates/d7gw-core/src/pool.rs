//! ---
//! gw_section: "05-dispatch"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sharded worker pool keeping per-transmitter ordering."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use d7gw_common::BridgeConfig;

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::{InboundCommand, PoolError};

/// Totals reported by the workers when the pool shuts down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolSummary {
    /// Commands taken off the queues.
    pub dispatched: u64,
    /// Commands that produced intents.
    pub published: u64,
    /// First publications of a transmitter.
    pub births: u64,
    /// Commands dropped for any reason.
    pub dropped: u64,
}

impl PoolSummary {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.dispatched += 1;
        match outcome {
            DispatchOutcome::Published { birth, .. } => {
                self.published += 1;
                if *birth {
                    self.births += 1;
                }
            }
            _ => self.dropped += 1,
        }
    }

    fn merge(&mut self, other: PoolSummary) {
        self.dispatched += other.dispatched;
        self.published += other.published;
        self.births += other.births;
        self.dropped += other.dropped;
    }
}

/// Dispatch workers, one queue each.
///
/// Commands are routed by sender id, so every command of one transmitter is
/// handled by the same worker in arrival order while different transmitters
/// run in parallel. Commands without a sender id go to the first worker.
pub struct DispatchPool {
    senders: Vec<mpsc::Sender<InboundCommand>>,
    workers: Vec<JoinHandle<PoolSummary>>,
}

impl DispatchPool {
    /// Start `workers` tasks, each with a queue of `queue_depth` commands.
    pub fn spawn(dispatcher: Arc<Dispatcher>, workers: usize, queue_depth: usize) -> Self {
        let workers = workers.max(1);
        let queue_depth = queue_depth.max(1);
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let (tx, rx) = mpsc::channel(queue_depth);
            senders.push(tx);
            handles.push(tokio::spawn(run_worker(index, dispatcher.clone(), rx)));
        }
        info!(workers, queue_depth, "dispatch pool started");
        Self {
            senders,
            workers: handles,
        }
    }

    /// Pool sized by the `[bridge]` section.
    pub fn from_config(dispatcher: Arc<Dispatcher>, config: &BridgeConfig) -> Self {
        Self::spawn(dispatcher, config.workers, config.queue_depth)
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.senders.len()
    }

    /// Worker index a command is routed to.
    pub fn shard_for(&self, command: &InboundCommand) -> usize {
        let workers = self.senders.len() as u64;
        command.sender_id.map_or(0, |id| (id % workers) as usize)
    }

    /// Queue a command, waiting while the worker's queue is full.
    pub async fn submit(&self, command: InboundCommand) -> Result<(), PoolError> {
        let shard = self.shard_for(&command);
        self.senders[shard]
            .send(command)
            .await
            .map_err(|_| PoolError::WorkerClosed(shard))
    }

    /// Close the queues, let the workers drain them and collect their totals.
    pub async fn shutdown(self) -> PoolSummary {
        drop(self.senders);
        let mut summary = PoolSummary::default();
        for (index, handle) in self.workers.into_iter().enumerate() {
            match handle.await {
                Ok(worker) => summary.merge(worker),
                Err(err) => warn!(worker = index, error = %err, "dispatch worker failed"),
            }
        }
        info!(
            dispatched = summary.dispatched,
            published = summary.published,
            births = summary.births,
            dropped = summary.dropped,
            "dispatch pool drained"
        );
        summary
    }
}

async fn run_worker(
    index: usize,
    dispatcher: Arc<Dispatcher>,
    mut rx: mpsc::Receiver<InboundCommand>,
) -> PoolSummary {
    let mut summary = PoolSummary::default();
    while let Some(command) = rx.recv().await {
        let outcome = dispatcher.dispatch(&command);
        summary.record(&outcome);
    }
    debug!(worker = index, dispatched = summary.dispatched, "dispatch worker stopped");
    summary
}

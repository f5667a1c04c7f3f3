//! ---
//! gw_section: "03-publish-bus"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Publish intents and the boundary towards the publish bus."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::logging::{log_intent, BridgeMetrics, IntentDirection};
use crate::{PublishIntent, Publisher};

/// Snapshot of publish counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishMetrics {
    /// Intents successfully handed to publishers.
    pub sent: u64,
    /// Intents a publisher refused.
    pub dropped: u64,
}

struct Counters {
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> PublishMetrics {
        PublishMetrics {
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Fans intents out to the registered publishers.
///
/// Failures are logged and counted, never retried: retry policy belongs to
/// the bus client behind each publisher.
pub struct PublishSupervisor {
    publishers: Vec<Arc<dyn Publisher>>,
    counters: Counters,
    metrics: Option<BridgeMetrics>,
}

impl PublishSupervisor {
    /// Supervisor without publishers.
    pub fn new() -> Self {
        Self {
            publishers: Vec::new(),
            counters: Counters::new(),
            metrics: None,
        }
    }

    /// Attach Prometheus counters.
    pub fn with_metrics(mut self, metrics: BridgeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register a publisher.
    pub fn register_publisher<P>(&mut self, publisher: Arc<P>)
    where
        P: Publisher + 'static,
    {
        self.publishers.push(publisher as Arc<dyn Publisher>);
    }

    /// Hand the intent to every publisher; returns how many accepted it.
    pub fn publish(&self, intent: &PublishIntent) -> usize {
        let mut accepted = 0;
        for publisher in &self.publishers {
            match publisher.publish(intent) {
                Ok(()) => {
                    log_intent(IntentDirection::Outbound, intent);
                    self.counters.sent.fetch_add(1, Ordering::Relaxed);
                    if let Some(metrics) = &self.metrics {
                        metrics.observe_published();
                    }
                    accepted += 1;
                }
                Err(err) => {
                    log_intent(IntentDirection::Rejected, intent);
                    tracing::warn!(
                        publisher = publisher.name(),
                        topic = intent.topic(),
                        error = %err,
                        "publish failed"
                    );
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    if let Some(metrics) = &self.metrics {
                        metrics.observe_failed();
                    }
                }
            }
        }
        accepted
    }

    /// Return the current counter snapshot.
    pub fn metrics(&self) -> PublishMetrics {
        self.counters.snapshot()
    }
}

impl Default for PublishSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryPublisher, QualityOfService};

    fn supervisor_with_in_memory() -> (PublishSupervisor, Arc<InMemoryPublisher>) {
        let mut supervisor = PublishSupervisor::new();
        let publisher = Arc::new(InMemoryPublisher::new());
        supervisor.register_publisher(publisher.clone());
        (supervisor, publisher)
    }

    #[test]
    fn publish_reaches_publisher() {
        let (supervisor, publisher) = supervisor_with_in_memory();
        let intent = PublishIntent::transient("t", "1", QualityOfService::AtLeastOnce);
        assert_eq!(supervisor.publish(&intent), 1);
        assert_eq!(publisher.recv(), Some(intent));
        assert_eq!(supervisor.metrics(), PublishMetrics { sent: 1, dropped: 0 });
    }

    #[test]
    fn failures_are_counted_not_raised() {
        let (supervisor, publisher) = supervisor_with_in_memory();
        publisher.set_connected(false);
        let intent = PublishIntent::transient("t", "1", QualityOfService::AtLeastOnce);
        assert_eq!(supervisor.publish(&intent), 0);
        assert_eq!(supervisor.metrics().dropped, 1);

        publisher.set_connected(true);
        assert_eq!(supervisor.publish(&intent), 1);
        assert_eq!(supervisor.metrics().sent, 1);
    }
}

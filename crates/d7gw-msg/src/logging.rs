//! ---
//! gw_section: "03-publish-bus"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Publish intents and the boundary towards the publish bus."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use tracing::debug;

use crate::PublishIntent;

/// Direction of an intent, used for consistent logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentDirection {
    /// Intent handed to a publisher.
    Outbound,
    /// Intent a publisher refused.
    Rejected,
}

/// Emit a structured log entry for publish activity.
pub fn log_intent(direction: IntentDirection, intent: &PublishIntent) {
    debug!(
        topic = intent.topic(),
        qos = intent.qos().level(),
        retain = intent.retain(),
        bytes = intent.payload().len(),
        direction = ?direction,
        "publish activity"
    );
}

/// Why an inbound command produced no publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Required fields missing from the command.
    Malformed,
    /// File type not registered.
    UnknownFileType,
    /// Payload rejected by the codec.
    Undecodable,
    /// Translator had nothing to say about the record.
    NothingToPublish,
    /// Translator failed to render the record.
    TranslationFailed,
}

impl DropReason {
    /// Label value used for the `reason` dimension.
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Malformed => "malformed",
            DropReason::UnknownFileType => "unknown_file_type",
            DropReason::Undecodable => "undecodable",
            DropReason::NothingToPublish => "nothing_to_publish",
            DropReason::TranslationFailed => "translation_failed",
        }
    }
}

/// Prometheus metric handles for the gateway pipeline.
#[derive(Clone)]
pub struct BridgeMetrics {
    commands_received: IntCounter,
    commands_dropped: IntCounterVec,
    intents_published: IntCounter,
    intents_failed: IntCounter,
    births_emitted: IntCounter,
}

impl BridgeMetrics {
    /// Register gateway metrics with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let commands_received = IntCounter::with_opts(Opts::new(
            "commands_received_total",
            "Inbound commands accepted for dispatch",
        ))?;
        let commands_dropped = IntCounterVec::new(
            Opts::new(
                "commands_dropped_total",
                "Inbound commands that produced no publication",
            ),
            &["reason"],
        )?;
        let intents_published = IntCounter::with_opts(Opts::new(
            "intents_published_total",
            "Publish intents queued by a publisher",
        ))?;
        let intents_failed = IntCounter::with_opts(Opts::new(
            "intents_failed_total",
            "Publish intents a publisher refused",
        ))?;
        let births_emitted = IntCounter::with_opts(Opts::new(
            "births_emitted_total",
            "Transmitters announced for the first time",
        ))?;

        registry.register(Box::new(commands_received.clone()))?;
        registry.register(Box::new(commands_dropped.clone()))?;
        registry.register(Box::new(intents_published.clone()))?;
        registry.register(Box::new(intents_failed.clone()))?;
        registry.register(Box::new(births_emitted.clone()))?;

        Ok(Self {
            commands_received,
            commands_dropped,
            intents_published,
            intents_failed,
            births_emitted,
        })
    }

    /// Record an inbound command.
    pub fn observe_command(&self) {
        self.commands_received.inc();
    }

    /// Record a command that produced nothing.
    pub fn observe_dropped(&self, reason: DropReason) {
        self.commands_dropped
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    /// Record a queued intent.
    pub fn observe_published(&self) {
        self.intents_published.inc();
    }

    /// Record a refused intent.
    pub fn observe_failed(&self) {
        self.intents_failed.inc();
    }

    /// Record a first-seen transmitter.
    pub fn observe_birth(&self) {
        self.births_emitted.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_exporter_records_counts() {
        let registry = Registry::new();
        let metrics = BridgeMetrics::register(&registry).expect("register metrics");
        metrics.observe_command();
        metrics.observe_dropped(DropReason::UnknownFileType);
        metrics.observe_published();
        metrics.observe_failed();
        metrics.observe_birth();

        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "commands_dropped_total"));
        assert!(families
            .iter()
            .any(|f| f.get_name() == "births_emitted_total"));
    }

    #[test]
    fn registering_twice_fails() {
        let registry = Registry::new();
        BridgeMetrics::register(&registry).expect("first registration");
        assert!(BridgeMetrics::register(&registry).is_err());
    }
}

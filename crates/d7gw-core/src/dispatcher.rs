//! ---
//! gw_section: "05-dispatch"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Routes inbound commands through decode, translation and publish."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use d7gw_files::{FileId, FileRegistry, Record};
use d7gw_msg::{BridgeMetrics, DropReason, PublishSupervisor};
use d7gw_sinks::{Translation, TranslationContext, Translator, TransmitterId};

use crate::command::{CommandParts, InboundCommand};
use crate::tracker::TransmitterStateTracker;
use crate::BridgeError;

/// What happened to one inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Intents were handed to the publish bus.
    Published {
        /// Sender of the command.
        transmitter: TransmitterId,
        /// Intents emitted, birth included.
        intents: usize,
        /// Whether this was the transmitter's first publication.
        birth: bool,
    },
    /// The record decoded but the active sink does not represent it.
    NothingToPublish,
    /// Required fields were missing.
    Malformed,
    /// No codec is registered for the file type.
    UnknownFileType(FileId),
    /// The payload could not be decoded.
    Undecodable,
    /// The translator failed to render the record.
    TranslationFailed,
}

impl DispatchOutcome {
    /// True for [`DispatchOutcome::Published`].
    pub fn is_published(&self) -> bool {
        matches!(self, DispatchOutcome::Published { .. })
    }

    fn drop_reason(&self) -> Option<DropReason> {
        match self {
            DispatchOutcome::Published { .. } => None,
            DispatchOutcome::NothingToPublish => Some(DropReason::NothingToPublish),
            DispatchOutcome::Malformed => Some(DropReason::Malformed),
            DispatchOutcome::UnknownFileType(_) => Some(DropReason::UnknownFileType),
            DispatchOutcome::Undecodable => Some(DropReason::Undecodable),
            DispatchOutcome::TranslationFailed => Some(DropReason::TranslationFailed),
        }
    }
}

/// Turns inbound commands into ordered publish intents.
///
/// A transmitter's birth intents are emitted exactly once, before its first
/// data intents. The tracker lock is held from the first-seen check until
/// the last intent of the command is handed over, so concurrent callers
/// cannot interleave data ahead of a birth.
pub struct Dispatcher {
    registry: Arc<FileRegistry>,
    translator: Arc<dyn Translator>,
    tracker: Mutex<TransmitterStateTracker>,
    supervisor: Arc<PublishSupervisor>,
    metrics: Option<BridgeMetrics>,
}

impl Dispatcher {
    /// Dispatcher with an empty tracker and no metrics.
    pub fn new(
        registry: Arc<FileRegistry>,
        translator: Arc<dyn Translator>,
        supervisor: Arc<PublishSupervisor>,
    ) -> Self {
        Self {
            registry,
            translator,
            tracker: Mutex::new(TransmitterStateTracker::new()),
            supervisor,
            metrics: None,
        }
    }

    /// Count commands, drops and births in `metrics`.
    pub fn with_metrics(mut self, metrics: BridgeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start from an existing tracker instead of an empty one.
    pub fn with_tracker(mut self, tracker: TransmitterStateTracker) -> Self {
        self.tracker = Mutex::new(tracker);
        self
    }

    /// Codecs used for decoding.
    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// Supervisor the intents are handed to.
    pub fn supervisor(&self) -> &PublishSupervisor {
        &self.supervisor
    }

    /// Whether the transmitter has already published.
    pub fn is_known(&self, transmitter: TransmitterId) -> bool {
        self.tracker.lock().is_known(transmitter)
    }

    /// Number of transmitters that have published.
    pub fn known_transmitters(&self) -> usize {
        self.tracker.lock().len()
    }

    /// Process one command to completion. Never fails: every problem is
    /// logged and reported through the outcome.
    pub fn dispatch(&self, command: &InboundCommand) -> DispatchOutcome {
        if let Some(metrics) = &self.metrics {
            metrics.observe_command();
        }
        let outcome = self.process(command);
        if let (Some(metrics), Some(reason)) = (&self.metrics, outcome.drop_reason()) {
            metrics.observe_dropped(reason);
        }
        outcome
    }

    fn process(&self, command: &InboundCommand) -> DispatchOutcome {
        let parts = match command.parts() {
            Ok(parts) => parts,
            Err(err) => {
                debug!(
                    sender = ?command.sender_id,
                    payload = %command.payload.as_deref().map(hex::encode).unwrap_or_default(),
                    reason = %err,
                    "ignoring command without file data"
                );
                return DispatchOutcome::Malformed;
            }
        };
        let transmitter_hex = format!("{:X}", parts.sender_id);

        let record = match self.decode(&parts) {
            Ok(record) => record,
            Err(BridgeError::UnknownFileType(file_id)) => {
                info!(
                    transmitter = %transmitter_hex,
                    file_id,
                    payload = %hex::encode(parts.payload),
                    "received raw data"
                );
                return DispatchOutcome::UnknownFileType(file_id);
            }
            Err(err) => {
                warn!(
                    transmitter = %transmitter_hex,
                    file_id = parts.file_id,
                    payload = %hex::encode(parts.payload),
                    error = %err,
                    "failed to decode file"
                );
                return DispatchOutcome::Undecodable;
            }
        };
        info!(
            transmitter = %transmitter_hex,
            file = record.schema().name,
            link_budget = parts.link_budget,
            content = %record,
            "received file"
        );

        let ctx = TranslationContext::new(parts.sender_id, parts.link_budget);
        let translation = match self.translator.translate(&record, &ctx) {
            Ok(translation) => translation,
            Err(err) => {
                warn!(
                    transmitter = %transmitter_hex,
                    sink = %self.translator.kind(),
                    error = %err,
                    "failed to translate record"
                );
                return DispatchOutcome::TranslationFailed;
            }
        };
        if translation.is_empty() {
            debug!(
                transmitter = %transmitter_hex,
                file = record.schema().name,
                sink = %self.translator.kind(),
                "nothing to publish"
            );
            return DispatchOutcome::NothingToPublish;
        }

        self.emit(parts.sender_id, &transmitter_hex, translation)
    }

    fn decode(&self, parts: &CommandParts<'_>) -> Result<Record, BridgeError> {
        let codec = self
            .registry
            .lookup(parts.file_id)
            .ok_or(BridgeError::UnknownFileType(parts.file_id))?;
        Ok(codec.decode(parts.payload)?)
    }

    fn emit(
        &self,
        transmitter: TransmitterId,
        transmitter_hex: &str,
        translation: Translation,
    ) -> DispatchOutcome {
        let mut tracker = self.tracker.lock();
        let birth = tracker.mark_known(transmitter);

        let mut intents = 0;
        if birth {
            for intent in &translation.birth {
                self.supervisor.publish(intent);
                intents += 1;
            }
            if let Some(metrics) = &self.metrics {
                metrics.observe_birth();
            }
        }
        for intent in &translation.data {
            self.supervisor.publish(intent);
            intents += 1;
        }
        drop(tracker);

        info!(
            transmitter = %transmitter_hex,
            intents,
            birth,
            "published file"
        );
        DispatchOutcome::Published {
            transmitter,
            intents,
            birth,
        }
    }
}

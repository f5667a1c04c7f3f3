//! ---
//! gw_section: "04-sink-translators"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sink translators turning decoded records into publish intents."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Sink translators.
//!
//! A translator turns one decoded [`Record`] plus the metadata of the
//! command that carried it into a [`Translation`]: the one-time birth
//! intents a subscriber needs before it can interpret data for a new
//! transmitter, and the data intents for this record. Exactly one
//! translator is active per deployment; see [`from_config`].
#![warn(missing_docs)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use d7gw_common::{AppConfig, SinkKind};
use d7gw_files::{FieldKind, FieldValue, FileRegistry, NamedValue, Quantity, Record};
use d7gw_msg::PublishIntent;

pub mod home_assistant;
pub mod sparkplug;
pub mod time_series;

pub use home_assistant::HomeAssistantTranslator;
pub use sparkplug::SparkplugTranslator;
pub use time_series::TimeSeriesTranslator;

/// Sender id of a field sensor.
pub type TransmitterId = u64;

/// Label of the synthesized link-budget value.
pub const LINK_BUDGET: &str = "LinkBudget";

/// Failure to render a record for a sink.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A JSON payload could not be produced.
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Per-command metadata available to every translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationContext {
    /// Sender of the command.
    pub transmitter: TransmitterId,
    /// Link budget reported with the command, in dB.
    pub link_budget: i32,
    /// Gateway time at which the command was processed.
    pub received_at: DateTime<Utc>,
}

impl TranslationContext {
    /// Context stamped with the current time.
    pub fn new(transmitter: TransmitterId, link_budget: i32) -> Self {
        Self {
            transmitter,
            link_budget,
            received_at: Utc::now(),
        }
    }

    /// Pin the reception time, mostly useful for deterministic output.
    pub fn at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Uppercase hex without leading zeros, as used in topics and unique ids.
    pub fn transmitter_hex(&self) -> String {
        format!("{:X}", self.transmitter)
    }

    /// The link budget as a named value, appended after the record's own values.
    pub fn link_budget_value(&self) -> NamedValue {
        NamedValue {
            name: LINK_BUDGET.to_owned(),
            kind: FieldKind::I32,
            quantity: Quantity::SignalStrength,
            value: FieldValue::Signed(i64::from(self.link_budget)),
        }
    }
}

/// Output of one translation, birth intents first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// Sent once per transmitter, ahead of its first data.
    pub birth: Vec<PublishIntent>,
    /// Sent for every record, in order.
    pub data: Vec<PublishIntent>,
}

impl Translation {
    /// The record has no representation in this sink.
    pub fn nothing() -> Self {
        Self::default()
    }

    /// True when there are no data intents; birth alone is never published.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Birth and data intents together.
    pub fn len(&self) -> usize {
        self.birth.len() + self.data.len()
    }
}

/// Capability shared by all sinks.
pub trait Translator: Send + Sync {
    /// Sink this translator renders for.
    fn kind(&self) -> SinkKind;

    /// Produce the intents for `record`. Returning an empty translation is
    /// a normal outcome for records the sink does not represent.
    fn translate(
        &self,
        record: &Record,
        ctx: &TranslationContext,
    ) -> Result<Translation, TranslateError>;
}

/// Record values followed by the link budget.
pub(crate) fn values_with_link_budget(record: &Record, ctx: &TranslationContext) -> Vec<NamedValue> {
    let mut values = record.values();
    values.push(ctx.link_budget_value());
    values
}

/// Instantiate the translator selected by `config.bridge.sink`.
pub fn from_config(config: &AppConfig, registry: &FileRegistry) -> Arc<dyn Translator> {
    match config.bridge.sink {
        SinkKind::HomeAssistant => Arc::new(HomeAssistantTranslator::new(
            config.home_assistant.clone(),
        )),
        SinkKind::TimeSeries => Arc::new(TimeSeriesTranslator::new(config.time_series.clone())),
        SinkKind::Sparkplug => Arc::new(SparkplugTranslator::new(
            config.sparkplug.clone(),
            registry,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmitter_hex_is_uppercase_without_padding() {
        let ctx = TranslationContext::new(0x0b57_00a3, -70);
        assert_eq!(ctx.transmitter_hex(), "B5700A3");
        assert_eq!(TranslationContext::new(0x0f, 0).transmitter_hex(), "F");
    }

    #[test]
    fn factory_follows_configured_sink() {
        let registry = FileRegistry::standard();
        let mut config = AppConfig::default();
        assert_eq!(
            from_config(&config, &registry).kind(),
            SinkKind::HomeAssistant
        );
        config.bridge.sink = SinkKind::Sparkplug;
        assert_eq!(from_config(&config, &registry).kind(), SinkKind::Sparkplug);
    }
}

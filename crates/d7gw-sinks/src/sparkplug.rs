//! ---
//! gw_section: "04-sink-translators"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sparkplug-style DBIRTH/DDATA translator."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Sparkplug-style metrics in JSON.
//!
//! The DBIRTH document lists every metric a transmitter may report, drawn
//! from all registered measurement schemas plus the link budget, so a single
//! birth per transmitter covers every file type it sends. DDATA carries the
//! metrics of one record with their values.
use serde::Serialize;
use serde_json::Value as JsonValue;

use d7gw_common::{SinkKind, SparkplugConfig};
use d7gw_files::{FieldKind, FileRegistry, Record};
use d7gw_msg::{PublishIntent, QualityOfService};

use crate::{
    values_with_link_budget, TranslateError, Translation, TranslationContext, Translator,
    LINK_BUDGET,
};

const QOS: QualityOfService = QualityOfService::AtLeastOnce;

/// Sparkplug device message types used by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Retained metric announcement.
    DeviceBirth,
    /// Metric values.
    DeviceData,
}

impl MessageType {
    /// Topic segment of the message type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::DeviceBirth => "DBIRTH",
            MessageType::DeviceData => "DDATA",
        }
    }
}

/// Name and data type of one metric, as announced in DBIRTH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDescriptor {
    /// Metric name, the value label.
    pub name: String,
    /// Sparkplug data type name such as `Int64`.
    pub data_type: &'static str,
}

#[derive(Debug, Serialize)]
struct BirthPayload<'a> {
    timestamp: i64,
    metrics: &'a [MetricDescriptor],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DataMetric {
    name: String,
    timestamp: i64,
    data_type: &'static str,
    value: JsonValue,
}

#[derive(Debug, Serialize)]
struct DataPayload {
    timestamp: i64,
    metrics: Vec<DataMetric>,
}

/// DBIRTH once per transmitter, DDATA for every measurement.
pub struct SparkplugTranslator {
    config: SparkplugConfig,
    birth_metrics: Vec<MetricDescriptor>,
}

impl SparkplugTranslator {
    /// Birth metrics are taken from every measurement schema in `registry`.
    pub fn new(config: SparkplugConfig, registry: &FileRegistry) -> Self {
        let mut birth_metrics: Vec<MetricDescriptor> = registry
            .measurement_schemas()
            .flat_map(|schema| schema.descriptors())
            .map(|(name, kind)| MetricDescriptor {
                name,
                data_type: kind.data_type(),
            })
            .collect();
        birth_metrics.push(MetricDescriptor {
            name: LINK_BUDGET.to_owned(),
            data_type: FieldKind::I32.data_type(),
        });
        Self {
            config,
            birth_metrics,
        }
    }

    /// Metrics announced in every DBIRTH.
    pub fn birth_metrics(&self) -> &[MetricDescriptor] {
        &self.birth_metrics
    }

    /// `{namespace}/{project_id}/{DBIRTH|DDATA}/{edge_node_id}/{transmitter}`.
    pub fn topic(&self, message: MessageType, transmitter_hex: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.config.namespace,
            self.config.project_id,
            message.as_str(),
            self.config.edge_node_id,
            transmitter_hex
        )
    }
}

impl Translator for SparkplugTranslator {
    fn kind(&self) -> SinkKind {
        SinkKind::Sparkplug
    }

    fn translate(
        &self,
        record: &Record,
        ctx: &TranslationContext,
    ) -> Result<Translation, TranslateError> {
        if !matches!(record, Record::Measurement(_)) {
            return Ok(Translation::nothing());
        }

        let timestamp = ctx.received_at.timestamp_millis();
        let transmitter_hex = ctx.transmitter_hex();

        let birth = PublishIntent::retained_json(
            self.topic(MessageType::DeviceBirth, &transmitter_hex),
            &BirthPayload {
                timestamp,
                metrics: &self.birth_metrics,
            },
            QOS,
        )?;

        let metrics = values_with_link_budget(record, ctx)
            .into_iter()
            .map(|named| DataMetric {
                name: named.name,
                timestamp,
                data_type: named.kind.data_type(),
                value: named.value.to_json(),
            })
            .collect();
        let data = PublishIntent::transient_json(
            self.topic(MessageType::DeviceData, &transmitter_hex),
            &DataPayload { timestamp, metrics },
            QOS,
        )?;

        Ok(Translation {
            birth: vec![birth],
            data: vec![data],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use d7gw_files::{ButtonFile, EnergyConfigFile};

    fn translator() -> SparkplugTranslator {
        SparkplugTranslator::new(
            SparkplugConfig {
                namespace: "mqtts".to_owned(),
                project_id: "plant".to_owned(),
                edge_node_id: "gw01".to_owned(),
            },
            &FileRegistry::standard(),
        )
    }

    #[test]
    fn birth_covers_all_measurement_metrics() {
        let translator = translator();
        let names: Vec<_> = translator
            .birth_metrics()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        // button: 3, energy: 13, link budget: 1
        assert_eq!(names.len(), 17);
        assert_eq!(names[0], "ButtonId");
        assert!(names.contains(&"RealEnergyC"));
        assert_eq!(names.last(), Some(&"LinkBudget"));
    }

    #[test]
    fn measurement_emits_birth_and_data() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let ctx = TranslationContext::new(0x2A, -55).at(at);
        let record = Record::from(ButtonFile {
            button_id: 2,
            mask: true,
            buttons_state: 1,
        });
        let out = translator().translate(&record, &ctx).expect("translate");

        assert_eq!(out.birth.len(), 1);
        assert_eq!(out.birth[0].topic(), "mqtts/plant/DBIRTH/gw01/2A");
        assert!(out.birth[0].retain());

        assert_eq!(out.data.len(), 1);
        let data = &out.data[0];
        assert_eq!(data.topic(), "mqtts/plant/DDATA/gw01/2A");
        assert!(!data.retain());
        let doc: JsonValue = serde_json::from_slice(data.payload()).expect("json");
        let metrics = doc["metrics"].as_array().expect("metrics");
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[1]["name"], "Mask");
        assert_eq!(metrics[1]["dataType"], "Boolean");
        assert_eq!(metrics[1]["value"], true);
        assert_eq!(metrics[3]["dataType"], "Int32");
        assert_eq!(metrics[3]["timestamp"], 1_700_000_000_123_i64);
    }

    #[test]
    fn configuration_is_not_published() {
        let out = translator()
            .translate(
                &Record::from(EnergyConfigFile::default()),
                &TranslationContext::new(1, 0),
            )
            .expect("translate");
        assert!(out.is_empty());
        assert!(out.birth.is_empty());
    }
}

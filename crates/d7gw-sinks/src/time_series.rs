//! ---
//! gw_section: "04-sink-translators"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Structured time-series translator."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use d7gw_common::{SinkKind, TimeSeriesConfig};
use d7gw_files::{FieldValue, Record};
use d7gw_msg::{PublishIntent, QualityOfService};

use crate::{values_with_link_budget, TranslateError, Translation, TranslationContext, Translator};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Quality code attached to every value; the sensors do not report one.
const QUALITY_GOOD: &str = "0";

#[derive(Debug, Serialize)]
struct TimeSeriesPayload {
    timeseries: Vec<TimeSeriesEntry>,
}

#[derive(Debug, Serialize)]
struct TimeSeriesEntry {
    timestamp: String,
    values: Vec<DataPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DataPoint {
    data_point_id: String,
    value: JsonValue,
    quality_code: &'static str,
}

/// One non-retained JSON document per measurement on a fixed topic.
/// Configuration records are not represented.
pub struct TimeSeriesTranslator {
    config: TimeSeriesConfig,
}

impl TimeSeriesTranslator {
    /// Translator publishing on `config.topic`.
    pub fn new(config: TimeSeriesConfig) -> Self {
        Self { config }
    }

    /// Topic every document is published on.
    pub fn topic(&self) -> &str {
        &self.config.topic
    }
}

/// `RealEnergyA` becomes `realEnergyA`.
pub fn data_point_id(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Booleans travel as the strings `"true"`/`"false"`.
fn data_point_value(value: FieldValue) -> JsonValue {
    match value {
        FieldValue::Bool(flag) => JsonValue::from(flag.to_string()),
        other => other.to_json(),
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

impl Translator for TimeSeriesTranslator {
    fn kind(&self) -> SinkKind {
        SinkKind::TimeSeries
    }

    fn translate(
        &self,
        record: &Record,
        ctx: &TranslationContext,
    ) -> Result<Translation, TranslateError> {
        if !matches!(record, Record::Measurement(_)) {
            return Ok(Translation::nothing());
        }

        let values = values_with_link_budget(record, ctx)
            .into_iter()
            .map(|named| DataPoint {
                data_point_id: data_point_id(&named.name),
                value: data_point_value(named.value),
                quality_code: QUALITY_GOOD,
            })
            .collect();
        let payload = TimeSeriesPayload {
            timeseries: vec![TimeSeriesEntry {
                timestamp: format_timestamp(ctx.received_at),
                values,
            }],
        };

        Ok(Translation {
            birth: Vec::new(),
            data: vec![PublishIntent::transient_json(
                self.config.topic.clone(),
                &payload,
                QualityOfService::AtLeastOnce,
            )?],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use d7gw_files::{ButtonConfigFile, ButtonFile};

    fn translator() -> TimeSeriesTranslator {
        TimeSeriesTranslator::new(TimeSeriesConfig {
            topic: "plant/ts".to_owned(),
        })
    }

    #[test]
    fn configuration_yields_nothing() {
        let record = Record::from(ButtonConfigFile::default());
        let out = translator()
            .translate(&record, &TranslationContext::new(1, 0))
            .expect("translate");
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn button_payload_shape() {
        let record = Record::from(ButtonFile {
            button_id: 3,
            mask: false,
            buttons_state: 4,
        });
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap();
        let ctx = TranslationContext::new(7, -91).at(at);
        let out = translator().translate(&record, &ctx).expect("translate");
        assert!(out.birth.is_empty());
        assert_eq!(out.data.len(), 1);

        let intent = &out.data[0];
        assert_eq!(intent.topic(), "plant/ts");
        assert!(!intent.retain());
        let doc: JsonValue = serde_json::from_slice(intent.payload()).expect("json");
        let entry = &doc["timeseries"][0];
        assert_eq!(entry["timestamp"], "2024-05-01T12:30:05Z");
        let values = entry["values"].as_array().expect("values");
        assert_eq!(values.len(), 4);
        assert_eq!(values[0]["dataPointId"], "buttonId");
        assert_eq!(values[0]["value"], 3);
        assert_eq!(values[1]["value"], "false");
        assert_eq!(values[3]["dataPointId"], "linkBudget");
        assert_eq!(values[3]["value"], -91);
        assert!(values.iter().all(|v| v["qualityCode"] == "0"));
    }

    #[test]
    fn lower_camel_ids() {
        assert_eq!(data_point_id("MeasurementValid"), "measurementValid");
        assert_eq!(data_point_id("VoltageC"), "voltageC");
        assert_eq!(data_point_id(""), "");
    }
}

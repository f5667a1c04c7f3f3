//! ---
//! gw_section: "04-sink-translators"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Home Assistant MQTT discovery translator."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Home Assistant MQTT discovery.
//!
//! Every named value becomes its own entity: a retained discovery document on
//! `{prefix}/{component}/{unique_id}/config` and a retained state on
//! `.../state`. Booleans map to `binary_sensor` with `ON`/`OFF` states.
//!
//! Discovery documents go out with every record, ahead of its states, not as
//! a one-time birth: a transmitter reports several file types and each one
//! brings entities of its own.
use serde::Serialize;

use d7gw_common::{HomeAssistantConfig, SinkKind};
use d7gw_files::{FieldValue, NamedValue, Quantity, Record};
use d7gw_msg::{PublishIntent, QualityOfService};

use crate::{values_with_link_budget, TranslateError, Translation, TranslationContext, Translator};

const QOS: QualityOfService = QualityOfService::AtLeastOnce;

/// Entity platform a value is announced as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Numeric values.
    Sensor,
    /// Flags, reported as `ON`/`OFF`.
    BinarySensor,
}

impl Component {
    fn for_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Bool(_) => Component::BinarySensor,
            _ => Component::Sensor,
        }
    }

    /// Topic segment of the component.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Sensor => "sensor",
            Component::BinarySensor => "binary_sensor",
        }
    }
}

/// Device block shared by all entities of one transmitter.
#[derive(Debug, Clone, Serialize)]
struct DeviceInfo<'a> {
    ids: Vec<String>,
    name: String,
    #[serde(rename = "mf", skip_serializing_if = "Option::is_none")]
    manufacturer: Option<&'a str>,
}

/// Discovery document, abbreviated keys as accepted by Home Assistant.
#[derive(Debug, Serialize)]
struct DiscoveryConfig<'a> {
    device: &'a DeviceInfo<'a>,
    name: &'a str,
    qos: u8,
    unique_id: &'a str,
    state_topic: &'a str,
    #[serde(rename = "dev_cla", skip_serializing_if = "Option::is_none")]
    device_class: Option<&'static str>,
    #[serde(rename = "stat_cla", skip_serializing_if = "Option::is_none")]
    state_class: Option<&'static str>,
    #[serde(rename = "unit_of_meas", skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
    #[serde(rename = "ent_cat", skip_serializing_if = "Option::is_none")]
    entity_category: Option<&'static str>,
}

/// Device class, state class, unit and entity category for a sensor value.
struct SensorClass {
    device_class: Option<&'static str>,
    state_class: Option<&'static str>,
    unit: Option<&'static str>,
    entity_category: Option<&'static str>,
}

impl SensorClass {
    const NONE: SensorClass = SensorClass {
        device_class: None,
        state_class: None,
        unit: None,
        entity_category: None,
    };

    const fn measured(device_class: &'static str, unit: &'static str) -> Self {
        SensorClass {
            device_class: Some(device_class),
            state_class: Some("measurement"),
            unit: Some(unit),
            entity_category: None,
        }
    }

    const fn diagnostic(device_class: &'static str, unit: &'static str) -> Self {
        SensorClass {
            device_class: Some(device_class),
            state_class: None,
            unit: Some(unit),
            entity_category: Some("diagnostic"),
        }
    }

    fn of(component: Component, quantity: Quantity) -> Self {
        if component == Component::BinarySensor {
            return Self::NONE;
        }
        match quantity {
            Quantity::Energy => Self::measured("energy", "Wh"),
            Quantity::ApparentEnergy => Self::measured("apparent_power", "VAh"),
            Quantity::Current => Self::measured("current", "mA"),
            Quantity::Voltage => Self::measured("voltage", "V"),
            Quantity::Duration => Self::diagnostic("duration", "s"),
            Quantity::SignalStrength => Self::diagnostic("signal_strength", "dB"),
            Quantity::Identifier | Quantity::State | Quantity::Flag => Self::NONE,
        }
    }
}

/// Discovery and state intents for every named value of a record.
pub struct HomeAssistantTranslator {
    config: HomeAssistantConfig,
}

impl HomeAssistantTranslator {
    /// Translator using the configured prefix and device naming.
    pub fn new(config: HomeAssistantConfig) -> Self {
        Self { config }
    }

    fn topic(&self, component: Component, unique_id: &str, leaf: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.discovery_prefix,
            component.as_str(),
            unique_id,
            leaf
        )
    }

    fn entity(
        &self,
        device: &DeviceInfo<'_>,
        transmitter_hex: &str,
        value: &NamedValue,
        configs: &mut Vec<PublishIntent>,
        states: &mut Vec<PublishIntent>,
    ) -> Result<(), TranslateError> {
        let component = Component::for_value(&value.value);
        let unique_id = format!("{}_{}", transmitter_hex, value.name);
        let state_topic = self.topic(component, &unique_id, "state");
        let class = SensorClass::of(component, value.quantity);

        let config = DiscoveryConfig {
            device,
            name: &value.name,
            qos: QOS.level(),
            unique_id: &unique_id,
            state_topic: &state_topic,
            device_class: class.device_class,
            state_class: class.state_class,
            unit: class.unit,
            entity_category: class.entity_category,
        };
        configs.push(PublishIntent::retained_json(
            self.topic(component, &unique_id, "config"),
            &config,
            QOS,
        )?);
        states.push(PublishIntent::retained(
            state_topic,
            state_payload(&value.value),
            QOS,
        ));
        Ok(())
    }
}

/// `ON`/`OFF` for flags, the plain number otherwise.
pub fn state_payload(value: &FieldValue) -> String {
    match value {
        FieldValue::Bool(true) => "ON".to_owned(),
        FieldValue::Bool(false) => "OFF".to_owned(),
        other => other.to_string(),
    }
}

impl Translator for HomeAssistantTranslator {
    fn kind(&self) -> SinkKind {
        SinkKind::HomeAssistant
    }

    fn translate(
        &self,
        record: &Record,
        ctx: &TranslationContext,
    ) -> Result<Translation, TranslateError> {
        let transmitter_hex = ctx.transmitter_hex();
        let device = DeviceInfo {
            ids: vec![transmitter_hex.clone()],
            name: format!("{} {}", self.config.device_name_prefix, transmitter_hex),
            manufacturer: self.config.manufacturer.as_deref(),
        };

        let mut configs = Vec::new();
        let mut states = Vec::new();
        for value in values_with_link_budget(record, ctx) {
            self.entity(&device, &transmitter_hex, &value, &mut configs, &mut states)?;
        }
        configs.append(&mut states);
        Ok(Translation {
            birth: Vec::new(),
            data: configs,
        })
    }
}

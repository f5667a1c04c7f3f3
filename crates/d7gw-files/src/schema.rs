//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Declarative description of sensor file layouts.
use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::FileId;

/// Suffixes used for per-phase values.
pub const PHASE_SUFFIXES: [&str; 3] = ["A", "B", "C"];

/// Wire type of a single schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// One byte, zero is false and anything else is true.
    Bool,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
}

impl FieldKind {
    /// Encoded width of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            FieldKind::Bool | FieldKind::U8 => 1,
            FieldKind::I16 => 2,
            FieldKind::U32 | FieldKind::I32 => 4,
            FieldKind::I64 => 8,
        }
    }

    /// Sparkplug data type name for this kind.
    pub const fn data_type(self) -> &'static str {
        match self {
            FieldKind::Bool => "Boolean",
            FieldKind::U8 => "UInt8",
            FieldKind::U32 => "UInt32",
            FieldKind::I16 => "Int16",
            FieldKind::I32 => "Int32",
            FieldKind::I64 => "Int64",
        }
    }
}

/// What a field measures; translators derive units and classes from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Identifier reported by the device (e.g. which button fired).
    Identifier,
    /// Raw device state bit mask.
    State,
    /// On/off flag.
    Flag,
    /// Real energy in Wh.
    Energy,
    /// Apparent energy in VAh.
    ApparentEnergy,
    /// Current in mA.
    Current,
    /// Voltage in V.
    Voltage,
    /// Interval in seconds.
    Duration,
    /// Radio link budget in dB.
    SignalStrength,
}

/// One entry of a schema. Phased entries repeat `kind` once per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Field name as used by the firmware.
    pub name: &'static str,
    /// Display label used in outbound messages.
    pub label: &'static str,
    /// Wire type of each element.
    pub kind: FieldKind,
    /// Number of elements (1 for scalars, 3 for three-phase values).
    pub phases: usize,
    /// Semantic quantity.
    pub quantity: Quantity,
}

impl FieldSpec {
    /// Single-element field.
    pub const fn scalar(
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        quantity: Quantity,
    ) -> Self {
        Self {
            name,
            label,
            kind,
            phases: 1,
            quantity,
        }
    }

    /// Three-phase field (phases A, B and C).
    pub const fn three_phase(
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        quantity: Quantity,
    ) -> Self {
        Self {
            name,
            label,
            kind,
            phases: 3,
            quantity,
        }
    }

    /// Encoded width of the whole field.
    pub const fn width(&self) -> usize {
        self.kind.width() * self.phases
    }

    /// Labels of the flattened values, e.g. `RealEnergyA`, `RealEnergyB`, ...
    pub fn labels(&self) -> Vec<String> {
        if self.phases == 1 {
            return vec![self.label.to_owned()];
        }
        PHASE_SUFFIXES
            .iter()
            .take(self.phases)
            .map(|suffix| format!("{}{}", self.label, suffix))
            .collect()
    }
}

/// Whether a file carries a reading or echoes device settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Momentary sensor reading.
    Measurement,
    /// Device-side configuration.
    Configuration,
}

/// Layout of a sensor file.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// File identifier on the sensor.
    pub file_id: FileId,
    /// Short name used in logs and enumeration.
    pub name: &'static str,
    /// Measurement or configuration.
    pub kind: RecordKind,
    /// Fields in encoding order.
    pub fields: &'static [FieldSpec],
    /// Size reserved for the file in the sensor file system.
    pub allocated_size: usize,
}

impl Schema {
    /// Number of bytes a record occupies on the wire.
    pub const fn file_size(&self) -> usize {
        let mut total = 0;
        let mut index = 0;
        while index < self.fields.len() {
            total += self.fields[index].width();
            index += 1;
        }
        total
    }

    /// Pair flattened values with their labels and quantities.
    ///
    /// `values` must follow schema order; surplus values are ignored.
    pub fn named_values(&self, values: &[FieldValue]) -> Vec<NamedValue> {
        let slots = self.fields.iter().flat_map(|field| {
            field
                .labels()
                .into_iter()
                .map(move |label| (label, field.kind, field.quantity))
        });
        slots
            .zip(values.iter().copied())
            .map(|((name, kind, quantity), value)| NamedValue {
                name,
                kind,
                quantity,
                value,
            })
            .collect()
    }

    /// Flattened `(label, kind)` pairs, in schema order.
    pub fn descriptors(&self) -> Vec<(String, FieldKind)> {
        self.fields
            .iter()
            .flat_map(|field| {
                field
                    .labels()
                    .into_iter()
                    .map(move |label| (label, field.kind))
            })
            .collect()
    }
}

/// Decoded value of one schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag.
    Bool(bool),
    /// Unsigned integer of any declared width.
    Unsigned(u64),
    /// Signed integer of any declared width.
    Signed(i64),
}

impl FieldValue {
    /// Returns the flag if this is a boolean.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(flag),
            _ => None,
        }
    }

    /// Plain JSON representation (`true`, `42`, `-7`).
    pub fn to_json(self) -> JsonValue {
        match self {
            FieldValue::Bool(flag) => JsonValue::from(flag),
            FieldValue::Unsigned(value) => JsonValue::from(value),
            FieldValue::Signed(value) => JsonValue::from(value),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(flag) => write!(f, "{}", flag),
            FieldValue::Unsigned(value) => write!(f, "{}", value),
            FieldValue::Signed(value) => write!(f, "{}", value),
        }
    }
}

/// A labelled value taken from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
    /// Display label, phase suffix included.
    pub name: String,
    /// Wire type the value was read as.
    pub kind: FieldKind,
    /// Semantic quantity.
    pub quantity: Quantity,
    /// The value itself.
    pub value: FieldValue,
}

//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Three-phase energy reading (file 52) and energy configuration (file 62).
use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::record::FileRecord;
use crate::schema::{FieldKind, FieldSpec, FieldValue, Quantity, RecordKind, Schema};
use crate::wire::WireField;

static ENERGY_FIELDS: [FieldSpec; 5] = [
    FieldSpec::three_phase(
        "apparent_energy",
        "ApparentEnergy",
        FieldKind::I64,
        Quantity::ApparentEnergy,
    ),
    FieldSpec::three_phase("real_energy", "RealEnergy", FieldKind::I64, Quantity::Energy),
    FieldSpec::three_phase("current", "Current", FieldKind::I64, Quantity::Current),
    FieldSpec::three_phase("voltage", "Voltage", FieldKind::I16, Quantity::Voltage),
    FieldSpec::scalar(
        "measurement_valid",
        "MeasurementValid",
        FieldKind::Bool,
        Quantity::Flag,
    ),
];

static ENERGY_SCHEMA: Schema = Schema {
    file_id: 52,
    name: "energy",
    kind: RecordKind::Measurement,
    fields: &ENERGY_FIELDS,
    allocated_size: 97,
};

static ENERGY_CONFIG_FIELDS: [FieldSpec; 2] = [
    FieldSpec::scalar("interval", "Interval", FieldKind::U32, Quantity::Duration),
    FieldSpec::scalar("enabled", "Enabled", FieldKind::Bool, Quantity::Flag),
];

static ENERGY_CONFIG_SCHEMA: Schema = Schema {
    file_id: 62,
    name: "energy-config",
    kind: RecordKind::Configuration,
    fields: &ENERGY_CONFIG_FIELDS,
    allocated_size: 17,
};

/// Per-phase meter reading, phases A, B and C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnergyFile {
    /// Apparent energy per phase (VAh).
    pub apparent_energy: [i64; 3],
    /// Real energy per phase (Wh).
    pub real_energy: [i64; 3],
    /// Current per phase (mA).
    pub current: [i64; 3],
    /// Voltage per phase (V).
    pub voltage: [i16; 3],
    /// Whether the meter answered the last poll.
    pub measurement_valid: bool,
}

impl FileRecord for EnergyFile {
    const SCHEMA: &'static Schema = &ENERGY_SCHEMA;

    fn read_fields<B: Buf>(buf: &mut B) -> Self {
        Self {
            apparent_energy: <[i64; 3]>::read(buf),
            real_energy: <[i64; 3]>::read(buf),
            current: <[i64; 3]>::read(buf),
            voltage: <[i16; 3]>::read(buf),
            measurement_valid: bool::read(buf),
        }
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B) {
        self.apparent_energy.write(buf);
        self.real_energy.write(buf);
        self.current.write(buf);
        self.voltage.write(buf);
        self.measurement_valid.write(buf);
    }

    fn field_values(&self) -> Vec<FieldValue> {
        let mut out = Vec::with_capacity(13);
        self.apparent_energy.push_values(&mut out);
        self.real_energy.push_values(&mut out);
        self.current.push_values(&mut out);
        self.voltage.push_values(&mut out);
        self.measurement_valid.push_values(&mut out);
        out
    }
}

impl fmt::Display for EnergyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "apparent_energy={:?}, real_energy={:?}, current={:?}, voltage={:?}, measurement_valid={}",
            self.apparent_energy,
            self.real_energy,
            self.current,
            self.voltage,
            self.measurement_valid
        )
    }
}

/// Energy sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyConfigFile {
    /// Seconds between measurements.
    pub interval: u32,
    /// Measurements enabled.
    pub enabled: bool,
}

impl Default for EnergyConfigFile {
    fn default() -> Self {
        Self {
            interval: 15 * 60,
            enabled: true,
        }
    }
}

impl FileRecord for EnergyConfigFile {
    const SCHEMA: &'static Schema = &ENERGY_CONFIG_SCHEMA;

    fn read_fields<B: Buf>(buf: &mut B) -> Self {
        Self {
            interval: u32::read(buf),
            enabled: bool::read(buf),
        }
    }

    fn write_fields<B: BufMut>(&self, buf: &mut B) {
        self.interval.write(buf);
        self.enabled.write(buf);
    }

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Unsigned(u64::from(self.interval)),
            FieldValue::Bool(self.enabled),
        ]
    }
}

impl fmt::Display for EnergyConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interval={}, enabled={}", self.interval, self.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_layout_is_fixed() {
        assert_eq!(EnergyFile::FILE_SIZE, 79);
        assert_eq!(EnergyFile::SCHEMA.allocated_size, 97);
        assert_eq!(EnergyConfigFile::FILE_SIZE, 5);
    }

    #[test]
    fn zeroed_allocation_with_valid_flag() {
        let mut bytes = vec![0u8; EnergyFile::SCHEMA.allocated_size];
        bytes[EnergyFile::FILE_SIZE - 1] = 1;

        let file = EnergyFile::decode(&bytes).expect("decode");
        assert_eq!(file.apparent_energy, [0, 0, 0]);
        assert_eq!(file.real_energy, [0, 0, 0]);
        assert_eq!(file.current, [0, 0, 0]);
        assert_eq!(file.voltage, [0, 0, 0]);
        assert!(file.measurement_valid);
    }

    #[test]
    fn one_byte_short_is_truncated() {
        let bytes = vec![0u8; EnergyFile::FILE_SIZE - 1];
        assert!(EnergyFile::decode(&bytes).is_err());
    }

    #[test]
    fn phases_are_read_in_order() {
        let mut bytes = Vec::new();
        for value in [1i64, 2, 3, 10, 20, 30, -1, -2, -3] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for value in [230i16, 231, 229] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes.push(0);

        let file = EnergyFile::decode(&bytes).expect("decode");
        assert_eq!(file.apparent_energy, [1, 2, 3]);
        assert_eq!(file.real_energy, [10, 20, 30]);
        assert_eq!(file.current, [-1, -2, -3]);
        assert_eq!(file.voltage, [230, 231, 229]);
        assert!(!file.measurement_valid);
        assert_eq!(file.encode().as_ref(), bytes.as_slice());
    }

    #[test]
    fn config_interval_is_little_endian() {
        let file = EnergyConfigFile::decode(&[0x84, 0x03, 0x00, 0x00, 0x01]).expect("decode");
        assert_eq!(file.interval, 900);
        assert!(file.enabled);
        assert_eq!(file.named_values()[0].name, "Interval");
    }
}

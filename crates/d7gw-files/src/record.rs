//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::button::{ButtonConfigFile, ButtonFile};
use crate::energy::{EnergyConfigFile, EnergyFile};
use crate::schema::{FieldValue, NamedValue, RecordKind, Schema};
use crate::{DecodeError, FileId};

/// Typed view of one sensor file.
///
/// Implementors list their fields in the same order as `SCHEMA`; the
/// provided `decode`/`encode` handle length checks and buffer management.
pub trait FileRecord: Sized {
    /// Layout of the file.
    const SCHEMA: &'static Schema;
    /// Wire length of a record.
    const FILE_SIZE: usize = Self::SCHEMA.file_size();

    /// Read all fields. At least `FILE_SIZE` bytes are available.
    fn read_fields<B: Buf>(buf: &mut B) -> Self;

    /// Write all fields in schema order.
    fn write_fields<B: BufMut>(&self, buf: &mut B);

    /// Field values flattened in schema order.
    fn field_values(&self) -> Vec<FieldValue>;

    /// Decode a record from the front of `bytes`; trailing bytes are ignored.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut buf = bytes;
        Self::decode_from(&mut buf)
    }

    /// Decode a record, advancing `buf` by exactly `FILE_SIZE` bytes.
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        if buf.remaining() < Self::FILE_SIZE {
            return Err(DecodeError::TruncatedInput {
                file_id: Self::SCHEMA.file_id,
                name: Self::SCHEMA.name,
                expected: Self::FILE_SIZE,
                actual: buf.remaining(),
            });
        }
        Ok(Self::read_fields(buf))
    }

    /// Encode into exactly `FILE_SIZE` bytes.
    fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(Self::FILE_SIZE);
        self.write_fields(&mut out);
        out.freeze()
    }

    /// Labelled values in schema order.
    fn named_values(&self) -> Vec<NamedValue> {
        Self::SCHEMA.named_values(&self.field_values())
    }
}

/// Momentary sensor readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    /// Button press.
    Button(ButtonFile),
    /// Three-phase energy block.
    Energy(EnergyFile),
}

/// Device settings echoed back by a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Configuration {
    /// Button reporting configuration.
    Button(ButtonConfigFile),
    /// Energy sampling configuration.
    Energy(EnergyConfigFile),
}

/// A decoded sensor file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Record {
    /// Sensor reading.
    Measurement(Measurement),
    /// Echoed settings.
    Configuration(Configuration),
}

impl Record {
    /// Layout of the underlying file.
    pub fn schema(&self) -> &'static Schema {
        match self {
            Record::Measurement(Measurement::Button(_)) => ButtonFile::SCHEMA,
            Record::Measurement(Measurement::Energy(_)) => EnergyFile::SCHEMA,
            Record::Configuration(Configuration::Button(_)) => ButtonConfigFile::SCHEMA,
            Record::Configuration(Configuration::Energy(_)) => EnergyConfigFile::SCHEMA,
        }
    }

    /// File identifier of the record.
    pub fn file_id(&self) -> FileId {
        self.schema().file_id
    }

    /// Measurement or configuration.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Measurement(_) => RecordKind::Measurement,
            Record::Configuration(_) => RecordKind::Configuration,
        }
    }

    /// Labelled values in schema order.
    pub fn values(&self) -> Vec<NamedValue> {
        match self {
            Record::Measurement(Measurement::Button(file)) => file.named_values(),
            Record::Measurement(Measurement::Energy(file)) => file.named_values(),
            Record::Configuration(Configuration::Button(file)) => file.named_values(),
            Record::Configuration(Configuration::Energy(file)) => file.named_values(),
        }
    }

    /// Encode the record into its wire representation.
    pub fn encode(&self) -> Bytes {
        match self {
            Record::Measurement(Measurement::Button(file)) => file.encode(),
            Record::Measurement(Measurement::Energy(file)) => file.encode(),
            Record::Configuration(Configuration::Button(file)) => file.encode(),
            Record::Configuration(Configuration::Energy(file)) => file.encode(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Measurement(Measurement::Button(file)) => fmt::Display::fmt(file, f),
            Record::Measurement(Measurement::Energy(file)) => fmt::Display::fmt(file, f),
            Record::Configuration(Configuration::Button(file)) => fmt::Display::fmt(file, f),
            Record::Configuration(Configuration::Energy(file)) => fmt::Display::fmt(file, f),
        }
    }
}

impl From<ButtonFile> for Record {
    fn from(file: ButtonFile) -> Self {
        Record::Measurement(Measurement::Button(file))
    }
}

impl From<EnergyFile> for Record {
    fn from(file: EnergyFile) -> Self {
        Record::Measurement(Measurement::Energy(file))
    }
}

impl From<ButtonConfigFile> for Record {
    fn from(file: ButtonConfigFile) -> Self {
        Record::Configuration(Configuration::Button(file))
    }
}

impl From<EnergyConfigFile> for Record {
    fn from(file: EnergyConfigFile) -> Self {
        Record::Configuration(Configuration::Energy(file))
    }
}

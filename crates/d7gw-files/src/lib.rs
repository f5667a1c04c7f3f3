//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Binary codecs for the custom files written by the field sensors.
//!
//! Every file type is described by a static [`Schema`]: an ordered list of
//! fixed-width fields. Multi-byte integers are little-endian on both the
//! decode and the encode path, booleans occupy one full byte.
#![warn(missing_docs)]

pub mod button;
pub mod energy;
pub mod error;
pub mod record;
pub mod registry;
pub mod schema;
pub mod wire;

/// Numeric identifier of a sensor file.
pub type FileId = u8;

pub use button::{ButtonConfigFile, ButtonFile, ButtonState};
pub use energy::{EnergyConfigFile, EnergyFile};
pub use error::{DecodeError, FileError};
pub use record::{Configuration, FileRecord, Measurement, Record};
pub use registry::{Codec, FileRegistry};
pub use schema::{FieldKind, FieldSpec, FieldValue, NamedValue, Quantity, RecordKind, Schema};
pub use wire::WireField;

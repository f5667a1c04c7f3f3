//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Static mapping from file id to codec.
use std::collections::BTreeMap;
use std::fmt;

use crate::record::{FileRecord, Record};
use crate::schema::{RecordKind, Schema};
use crate::{ButtonConfigFile, ButtonFile, DecodeError, EnergyConfigFile, EnergyFile};
use crate::{FileError, FileId};

type DecodeFn = fn(&[u8]) -> Result<Record, DecodeError>;

fn decode_as<F>(bytes: &[u8]) -> Result<Record, DecodeError>
where
    F: FileRecord + Into<Record>,
{
    F::decode(bytes).map(Into::into)
}

/// Decoder for one registered file type.
#[derive(Clone, Copy)]
pub struct Codec {
    schema: &'static Schema,
    decode: DecodeFn,
}

impl Codec {
    /// Codec for the typed record `F`.
    pub fn of<F>() -> Self
    where
        F: FileRecord + Into<Record>,
    {
        Self {
            schema: F::SCHEMA,
            decode: decode_as::<F>,
        }
    }

    /// Layout handled by this codec.
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Decode raw file bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<Record, DecodeError> {
        (self.decode)(bytes)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("file_id", &self.schema.file_id)
            .field("name", &self.schema.name)
            .finish()
    }
}

/// File types understood by the gateway, fixed at construction.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    codecs: BTreeMap<FileId, Codec>,
}

impl FileRegistry {
    /// Registry holding the given codecs. A later codec with the same id
    /// replaces an earlier one.
    pub fn with_codecs(codecs: impl IntoIterator<Item = Codec>) -> Self {
        let codecs = codecs
            .into_iter()
            .map(|codec| (codec.schema.file_id, codec))
            .collect();
        Self { codecs }
    }

    /// The button and energy files written by the sensor firmware.
    pub fn standard() -> Self {
        Self::with_codecs([
            Codec::of::<ButtonFile>(),
            Codec::of::<EnergyFile>(),
            Codec::of::<ButtonConfigFile>(),
            Codec::of::<EnergyConfigFile>(),
        ])
    }

    /// Codec registered for `file_id`, if any.
    pub fn lookup(&self, file_id: FileId) -> Option<&Codec> {
        self.codecs.get(&file_id)
    }

    /// Resolve the codec and decode in one step.
    pub fn decode(&self, file_id: FileId, bytes: &[u8]) -> Result<Record, FileError> {
        let codec = self
            .lookup(file_id)
            .ok_or(FileError::UnknownFileType(file_id))?;
        Ok(codec.decode(bytes)?)
    }

    /// Registered ids in ascending order.
    pub fn list_registered(&self) -> Vec<FileId> {
        self.codecs.keys().copied().collect()
    }

    /// Registered schemas in ascending id order.
    pub fn schemas(&self) -> impl Iterator<Item = &'static Schema> + '_ {
        self.codecs.values().map(|codec| codec.schema)
    }

    /// Schemas of measurement files only, ascending id order.
    pub fn measurement_schemas(&self) -> impl Iterator<Item = &'static Schema> + '_ {
        self.schemas()
            .filter(|schema| schema.kind == RecordKind::Measurement)
    }
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Measurement;

    #[test]
    fn standard_registry_is_sorted() {
        let registry = FileRegistry::standard();
        assert_eq!(registry.list_registered(), vec![51, 52, 61, 62]);
        let names: Vec<_> = registry.measurement_schemas().map(|s| s.name).collect();
        assert_eq!(names, vec!["button", "energy"]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let registry = FileRegistry::standard();
        assert!(registry.lookup(0xFF).is_none());
        assert_eq!(
            registry.decode(0xFF, &[0x00]),
            Err(FileError::UnknownFileType(0xFF))
        );
    }

    #[test]
    fn decode_routes_by_id() {
        let registry = FileRegistry::standard();
        let record = registry.decode(51, &[0x02, 0x00, 0x00]).expect("decode");
        assert!(matches!(
            record,
            Record::Measurement(Measurement::Button(ButtonFile { button_id: 2, .. }))
        ));
        assert!(matches!(
            registry.decode(62, &[0x01]),
            Err(FileError::Decode(DecodeError::TruncatedInput { .. }))
        ));
    }
}

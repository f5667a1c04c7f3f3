//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Sensor file schemas, binary codecs and the file registry."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use crate::FileId;

/// Failure to turn raw file bytes into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes were supplied than the schema's fixed length.
    #[error("truncated {name} file {file_id}: expected {expected} bytes, got {actual}")]
    TruncatedInput {
        /// File type that was being decoded.
        file_id: FileId,
        /// Schema name of that file type.
        name: &'static str,
        /// Fixed wire length of the schema.
        expected: usize,
        /// Number of bytes actually available.
        actual: usize,
    },
}

/// Errors raised by registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    /// No codec is registered for the file id.
    #[error("unknown file type {0}")]
    UnknownFileType(FileId),
    /// The codec rejected the payload.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

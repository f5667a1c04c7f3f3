//! ---
//! gw_section: "05-dispatch"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Error taxonomy of the dispatch pipeline."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use thiserror::Error;

use d7gw_files::{DecodeError, FileId};
use d7gw_sinks::TranslateError;

/// Reasons a single command is dropped. None of these are fatal; the
/// dispatcher turns each into a [`crate::DispatchOutcome`].
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A required field is absent; carries the field name.
    #[error("command is missing {0}")]
    MalformedCommand(&'static str),
    /// No codec is registered for the file id.
    #[error("file type {0} is not registered")]
    UnknownFileType(FileId),
    /// The payload did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The active sink could not render the record.
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Failures of the dispatch pool itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The worker owning the command's shard has exited.
    #[error("dispatch worker {0} is no longer running")]
    WorkerClosed(usize),
}

//! ---
//! gw_section: "05-dispatch"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Inbound command model supplied by the radio link decoder."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use serde::{Deserialize, Serialize};

use d7gw_files::FileId;
use d7gw_sinks::TransmitterId;

use crate::BridgeError;

/// A command as delivered by the link decoder. Every field may be absent;
/// traffic without file data shares the same channel as telemetry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCommand {
    /// Transmitter that sent the command.
    #[serde(default)]
    pub sender_id: Option<TransmitterId>,
    /// Link budget of the reception, in dB.
    #[serde(default)]
    pub link_budget: Option<i32>,
    /// File type of the payload.
    #[serde(default, alias = "file_type_id")]
    pub file_id: Option<FileId>,
    /// Raw file bytes, hex encoded on the wire.
    #[serde(default, with = "hex_payload")]
    pub payload: Option<Vec<u8>>,
}

/// The fields a complete telemetry command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandParts<'a> {
    /// Transmitter that sent the command.
    pub sender_id: TransmitterId,
    /// Link budget of the reception, in dB.
    pub link_budget: i32,
    /// File type of the payload.
    pub file_id: FileId,
    /// Raw file bytes.
    pub payload: &'a [u8],
}

impl InboundCommand {
    /// A telemetry command carrying file data.
    pub fn telemetry(
        sender_id: TransmitterId,
        link_budget: i32,
        file_id: FileId,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            sender_id: Some(sender_id),
            link_budget: Some(link_budget),
            file_id: Some(file_id),
            payload: Some(payload.into()),
        }
    }

    /// Parse one JSON line of the command feed.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Borrow the complete set of fields, or name the first missing one.
    pub fn parts(&self) -> Result<CommandParts<'_>, BridgeError> {
        let sender_id = self
            .sender_id
            .ok_or(BridgeError::MalformedCommand("sender_id"))?;
        let link_budget = self
            .link_budget
            .ok_or(BridgeError::MalformedCommand("link_budget"))?;
        let file_id = self
            .file_id
            .ok_or(BridgeError::MalformedCommand("file_id"))?;
        let payload = self
            .payload
            .as_deref()
            .ok_or(BridgeError::MalformedCommand("payload"))?;
        Ok(CommandParts {
            sender_id,
            link_budget,
            file_id,
            payload,
        })
    }
}

/// Optional byte payload carried as a hex string.
mod hex_payload {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(payload: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match payload {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|text| {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            hex::decode(compact).map_err(D::Error::custom)
        })
        .transpose()
    }
}

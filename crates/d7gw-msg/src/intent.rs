//! ---
//! gw_section: "03-publish-bus"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Publish intents and the boundary towards the publish bus."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use bytes::Bytes;
use serde::Serialize;

use crate::QualityOfService;

/// A message ready to be handed to the publish bus. Never mutated after
/// creation; clones share the payload buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishIntent {
    topic: String,
    payload: Bytes,
    qos: QualityOfService,
    retain: bool,
}

impl PublishIntent {
    /// Construct an intent from its parts.
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        qos: QualityOfService,
        retain: bool,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain,
        }
    }

    /// Retained intent; the broker keeps the last one per topic.
    pub fn retained(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        qos: QualityOfService,
    ) -> Self {
        Self::new(topic, payload, qos, true)
    }

    /// Non-retained intent.
    pub fn transient(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        qos: QualityOfService,
    ) -> Self {
        Self::new(topic, payload, qos, false)
    }

    /// Retained intent carrying `value` serialized as JSON.
    pub fn retained_json<T: Serialize>(
        topic: impl Into<String>,
        value: &T,
        qos: QualityOfService,
    ) -> serde_json::Result<Self> {
        Ok(Self::retained(topic, serde_json::to_vec(value)?, qos))
    }

    /// Non-retained intent carrying `value` serialized as JSON.
    pub fn transient_json<T: Serialize>(
        topic: impl Into<String>,
        value: &T,
        qos: QualityOfService,
    ) -> serde_json::Result<Self> {
        Ok(Self::transient(topic, serde_json::to_vec(value)?, qos))
    }

    /// Destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload as UTF-8, if it is valid text.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Requested delivery level.
    pub fn qos(&self) -> QualityOfService {
        self.qos
    }

    /// Whether the broker should retain the message.
    pub fn retain(&self) -> bool {
        self.retain
    }
}

//! ---
//! gw_section: "03-publish-bus"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Publish intents and the boundary towards the publish bus."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};

/// Delivery level requested from the publish bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityOfService {
    /// Fire and forget (level 0).
    AtMostOnce,
    /// Acknowledged delivery, duplicates possible (level 1).
    #[default]
    AtLeastOnce,
    /// Four-way handshake, no duplicates (level 2).
    ExactlyOnce,
}

impl QualityOfService {
    /// Numeric level as used on the wire.
    pub const fn level(self) -> u8 {
        match self {
            QualityOfService::AtMostOnce => 0,
            QualityOfService::AtLeastOnce => 1,
            QualityOfService::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for QualityOfService {
    type Error = u8;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(QualityOfService::AtMostOnce),
            1 => Ok(QualityOfService::AtLeastOnce),
            2 => Ok(QualityOfService::ExactlyOnce),
            other => Err(other),
        }
    }
}

impl fmt::Display for QualityOfService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qos{}", self.level())
    }
}

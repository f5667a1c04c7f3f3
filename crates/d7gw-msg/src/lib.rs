//! ---
//! gw_section: "03-publish-bus"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Publish intents and the boundary towards the publish bus."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Outbound side of the gateway: the immutable [`PublishIntent`], the
//! [`Publisher`] boundary implemented by bus clients, and the supervisor
//! that fans intents out and counts outcomes.
#![warn(missing_docs)]

pub mod intent;
pub mod logging;
pub mod publisher;
pub mod qos;
pub mod supervisor;

/// Shared result type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;

/// Reasons a publish could not be handed to the bus.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// The bus client has no live connection.
    #[error("publish bus disconnected")]
    Disconnected,
    /// The client's outgoing queue cannot take more messages.
    #[error("outgoing queue full, dropped message for {topic}")]
    QueueFull {
        /// Topic of the dropped intent.
        topic: String,
    },
    /// The client refused the message for another reason.
    #[error("{transport} rejected publish: {reason}")]
    Rejected {
        /// Publisher name.
        transport: &'static str,
        /// Client-supplied reason.
        reason: String,
    },
}

pub use intent::PublishIntent;
pub use logging::{log_intent, BridgeMetrics, DropReason, IntentDirection};
pub use publisher::{InMemoryPublisher, Publisher};
pub use qos::QualityOfService;
pub use supervisor::{PublishMetrics, PublishSupervisor};

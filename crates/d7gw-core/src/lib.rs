//! ---
//! gw_section: "05-dispatch"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Command dispatch pipeline from inbound command to publish intents."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Inbound side of the gateway: command model, per-transmitter bookkeeping,
//! the [`Dispatcher`] that turns one command into ordered publish intents,
//! and the worker pool that runs it.
#![warn(missing_docs)]

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod tracker;

pub use command::{CommandParts, InboundCommand};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{BridgeError, PoolError};
pub use pool::{DispatchPool, PoolSummary};
pub use tracker::TransmitterStateTracker;

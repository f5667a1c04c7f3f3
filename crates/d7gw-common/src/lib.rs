//! ---
//! gw_section: "01-core-functionality"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Shared primitives and utilities for the gateway runtime."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Core shared primitives for the gateway workspace.
//! This crate exposes configuration loading and logging bootstrap
//! consumed across the workspace.
#![warn(missing_docs)]

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, BridgeConfig, FeedConfig, HomeAssistantConfig, LoadedAppConfig, LoggingConfig,
    MqttConfig, SinkKind, SparkplugConfig, TimeSeriesConfig,
};
pub use logging::{init_tracing, log_file_name, LogFormat};

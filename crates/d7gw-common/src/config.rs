//! ---
//! gw_section: "01-core-functionality"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Shared primitives and utilities for the gateway runtime."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_sink() -> SinkKind {
    SinkKind::HomeAssistant
}

fn default_workers() -> usize {
    1
}

fn default_queue_depth() -> usize {
    256
}

fn default_mqtt_port() -> u16 {
    8883
}

fn default_tls() -> bool {
    true
}

fn default_client_id() -> String {
    "d7gw".to_owned()
}

fn default_keep_alive() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_capacity() -> usize {
    64
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_owned()
}

fn default_device_name_prefix() -> String {
    "DASH7".to_owned()
}

fn default_time_series_topic() -> String {
    "tc/d7gw/o/mc_v3/ts".to_owned()
}

fn default_sparkplug_namespace() -> String {
    "mqtts".to_owned()
}

fn default_feed_path() -> PathBuf {
    PathBuf::from("-")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the gateway runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[bridge]`: active sink and dispatch sizing.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// `[mqtt]`: broker connection.
    #[serde(default)]
    pub mqtt: MqttConfig,
    /// `[home_assistant]`: discovery naming.
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
    /// `[time_series]`: output topic.
    #[serde(default)]
    pub time_series: TimeSeriesConfig,
    /// `[sparkplug]`: topic namespace and ids.
    #[serde(default)]
    pub sparkplug: SparkplugConfig,
    /// `[feed]`: command source.
    #[serde(default)]
    pub feed: FeedConfig,
    /// `[logging]`: log outputs.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    /// The validated configuration.
    pub config: AppConfig,
    /// File it was read from.
    pub source: PathBuf,
}

impl AppConfig {
    /// Environment variable naming a config file that overrides the candidates.
    pub const ENV_CONFIG_PATH: &'static str = "D7GW_CONFIG";

    /// Load configuration from disk, respecting the `D7GW_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.bridge.validate()?;
        match self.bridge.sink {
            SinkKind::HomeAssistant => self.home_assistant.validate()?,
            SinkKind::TimeSeries => self.time_series.validate()?,
            SinkKind::Sparkplug => self.sparkplug.validate()?,
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Output format the gateway publishes in. Exactly one is active.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Home Assistant MQTT discovery (config + state per value).
    #[default]
    HomeAssistant,
    /// Time-series JSON on a single topic.
    TimeSeries,
    /// Sparkplug-style DBIRTH/DDATA metrics.
    Sparkplug,
}

impl SinkKind {
    /// Name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::HomeAssistant => "home-assistant",
            SinkKind::TimeSeries => "time-series",
            SinkKind::Sparkplug => "sparkplug",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home-assistant" | "homeassistant" => Ok(SinkKind::HomeAssistant),
            "time-series" | "timeseries" => Ok(SinkKind::TimeSeries),
            "sparkplug" => Ok(SinkKind::Sparkplug),
            other => Err(format!("unknown sink: {}", other)),
        }
    }
}

/// Sink selection and dispatch pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Output format published.
    #[serde(default = "default_sink")]
    pub sink: SinkKind,
    /// Dispatch shards; commands of one transmitter always land on the same shard.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Commands buffered per shard before submission waits.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            workers: default_workers(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl BridgeConfig {
    /// Both sizes must be at least one.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow!("bridge.workers must be at least 1"));
        }
        if self.queue_depth == 0 {
            return Err(anyhow!("bridge.queue_depth must be at least 1"));
        }
        Ok(())
    }
}

/// Broker connection settings.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host name.
    #[serde(default)]
    pub broker: String,
    /// Broker port.
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    /// Connect over TLS with the platform trust store.
    #[serde(default = "default_tls")]
    pub tls: bool,
    /// MQTT client identifier.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Used only together with `password`.
    #[serde(default)]
    pub username: Option<String>,
    /// Used only together with `username`.
    #[serde(default)]
    pub password: Option<String>,
    /// Keep-alive interval, in seconds in the file.
    #[serde(default = "default_keep_alive")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub keep_alive: Duration,
    /// Upper bound on the wait for the broker's connection acknowledgement.
    #[serde(default = "default_connect_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,
    /// Outgoing requests the client buffers before publishes are refused.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: String::new(),
            port: default_mqtt_port(),
            tls: default_tls(),
            client_id: default_client_id(),
            username: None,
            password: None,
            keep_alive: default_keep_alive(),
            connect_timeout: default_connect_timeout(),
            request_capacity: default_request_capacity(),
        }
    }
}

impl MqttConfig {
    /// Checked only when a live broker connection is requested.
    pub fn validate(&self) -> Result<()> {
        if self.broker.trim().is_empty() {
            return Err(anyhow!("mqtt.broker must be set"));
        }
        if self.connect_timeout.is_zero() {
            return Err(anyhow!("mqtt.connect_timeout must be greater than zero"));
        }
        if self.request_capacity == 0 {
            return Err(anyhow!("mqtt.request_capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Home Assistant discovery naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    /// First topic segment, `homeassistant` by default.
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    /// Device names are this prefix followed by the transmitter hex.
    #[serde(default = "default_device_name_prefix")]
    pub device_name_prefix: String,
    /// Optional `mf` entry of the device block.
    #[serde(default)]
    pub manufacturer: Option<String>,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            discovery_prefix: default_discovery_prefix(),
            device_name_prefix: default_device_name_prefix(),
            manufacturer: None,
        }
    }
}

impl HomeAssistantConfig {
    /// The prefix must not be empty.
    pub fn validate(&self) -> Result<()> {
        if self.discovery_prefix.trim().is_empty() {
            return Err(anyhow!("home_assistant.discovery_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Time-series output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesConfig {
    /// Topic every document is published on.
    #[serde(default = "default_time_series_topic")]
    pub topic: String,
}

impl Default for TimeSeriesConfig {
    fn default() -> Self {
        Self {
            topic: default_time_series_topic(),
        }
    }
}

impl TimeSeriesConfig {
    /// The topic must not be empty.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(anyhow!("time_series.topic must not be empty"));
        }
        Ok(())
    }
}

/// Sparkplug topic segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkplugConfig {
    /// First topic segment.
    #[serde(default = "default_sparkplug_namespace")]
    pub namespace: String,
    /// Project segment.
    #[serde(default)]
    pub project_id: String,
    /// Edge node segment.
    #[serde(default)]
    pub edge_node_id: String,
}

impl Default for SparkplugConfig {
    fn default() -> Self {
        Self {
            namespace: default_sparkplug_namespace(),
            project_id: String::new(),
            edge_node_id: String::new(),
        }
    }
}

impl SparkplugConfig {
    /// Every segment is non-empty and free of `/`, `+` and `#`.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("namespace", &self.namespace),
            ("project_id", &self.project_id),
            ("edge_node_id", &self.edge_node_id),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("sparkplug.{} must not be empty", key));
            }
            if value.contains(['/', '+', '#']) {
                return Err(anyhow!(
                    "sparkplug.{} must not contain topic separators or wildcards",
                    key
                ));
            }
        }
        Ok(())
    }
}

/// Source of inbound commands: newline-delimited JSON, `-` for stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed file path.
    #[serde(default = "default_feed_path")]
    pub path: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: default_feed_path(),
        }
    }
}

impl FeedConfig {
    /// True when the path is `-`.
    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

/// Log outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory of the rolling log file, created when missing.
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Stdout format.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log file name prefix, `d7gw` when unset.
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = "".parse().expect("defaults are valid");
        assert_eq!(config.bridge.sink, SinkKind::HomeAssistant);
        assert_eq!(config.bridge.workers, 1);
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.home_assistant.discovery_prefix, "homeassistant");
        assert_eq!(config.sparkplug.namespace, "mqtts");
        assert!(config.feed.is_stdin());
    }

    #[test]
    fn sparkplug_requires_ids() {
        let err = "[bridge]\nsink = \"sparkplug\"\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("sparkplug.project_id"));

        let config: AppConfig = r#"
            [bridge]
            sink = "sparkplug"
            [sparkplug]
            project_id = "plant"
            edge_node_id = "gw01"
        "#
        .parse()
        .expect("valid sparkplug config");
        assert_eq!(config.sparkplug.edge_node_id, "gw01");
    }

    #[test]
    fn zero_workers_rejected() {
        assert!("[bridge]\nworkers = 0\n".parse::<AppConfig>().is_err());
    }

    #[test]
    fn durations_are_seconds() {
        let config: AppConfig = "[mqtt]\nbroker = \"localhost\"\nconnect_timeout = 3\n"
            .parse()
            .expect("valid");
        assert_eq!(config.mqtt.connect_timeout, Duration::from_secs(3));
        config.mqtt.validate().expect("broker set");
        assert!(MqttConfig::default().validate().is_err());
    }

    #[test]
    fn sink_names_parse() {
        assert_eq!("time-series".parse::<SinkKind>(), Ok(SinkKind::TimeSeries));
        assert_eq!("Sparkplug".parse::<SinkKind>(), Ok(SinkKind::Sparkplug));
        assert!("influx".parse::<SinkKind>().is_err());
        assert_eq!(SinkKind::HomeAssistant.to_string(), "home-assistant");
    }
}

//! ---
//! gw_section: "13-testing-quality-assurance"
//! gw_subsection: "integration-tests"
//! gw_type: "source"
//! gw_scope: "test"
//! gw_description: "Configuration file discovery and parsing."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::fs;
use std::time::Duration;

use d7gw_common::{AppConfig, SinkKind};

const SAMPLE: &str = r#"
[bridge]
sink = "time-series"
workers = 4

[mqtt]
broker = "broker.local"
port = 1883
client_id = "gw-test"
keep_alive = 15

[time_series]
topic = "plant/ts"

[feed]
path = "/var/lib/d7gw/commands.jsonl"

[logging]
directory = "logs"
format = "pretty"
"#;

#[test]
fn first_existing_candidate_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.toml");
    let present = dir.path().join("gateway.toml");
    fs::write(&present, SAMPLE).expect("write config");

    let loaded = AppConfig::load_with_source(&[missing, present.clone()]).expect("load");
    assert_eq!(loaded.source, present);
    assert_eq!(loaded.config.bridge.sink, SinkKind::TimeSeries);
    assert_eq!(loaded.config.bridge.workers, 4);
    assert_eq!(loaded.config.mqtt.port, 1883);
    assert_eq!(loaded.config.mqtt.keep_alive, Duration::from_secs(15));
    assert_eq!(loaded.config.time_series.topic, "plant/ts");
    assert!(!loaded.config.feed.is_stdin());
}

#[test]
fn no_candidates_reports_inspected_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.toml");
    let err = AppConfig::load(&[missing]).unwrap_err();
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn invalid_file_fails_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[bridge]\nsink = \"time-series\"\n[time_series]\ntopic = \"  \"\n")
        .expect("write config");
    let err = AppConfig::load(&[path]).unwrap_err();
    assert!(format!("{:#}", err).contains("time_series.topic"));
}

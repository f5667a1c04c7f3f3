//! ---
//! gw_section: "13-testing-quality-assurance"
//! gw_subsection: "integration-tests"
//! gw_type: "source"
//! gw_scope: "test"
//! gw_description: "Translators driven by records decoded from raw payloads."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use d7gw_common::{AppConfig, SinkKind};
use d7gw_files::{FileRegistry, Record};
use d7gw_sinks::{from_config, TranslationContext};
use serde_json::Value;

fn energy_record() -> Record {
    let mut bytes = vec![0u8; 97];
    bytes[78] = 1;
    FileRegistry::standard().decode(52, &bytes).expect("decode energy")
}

#[test]
fn energy_time_series_lists_every_value_and_link_budget() {
    let mut config = AppConfig::default();
    config.bridge.sink = SinkKind::TimeSeries;
    let translator = from_config(&config, &FileRegistry::standard());

    let out = translator
        .translate(&energy_record(), &TranslationContext::new(0x1234, -42))
        .expect("translate");
    assert_eq!(out.data.len(), 1);

    let doc: Value = serde_json::from_slice(out.data[0].payload()).expect("json");
    let values = doc["timeseries"][0]["values"].as_array().expect("values");
    // 12 phase values, validity, link budget
    assert_eq!(values.len(), 14);
    assert!(values
        .iter()
        .any(|v| v["dataPointId"] == "linkBudget" && v["value"] == -42));
    assert!(values
        .iter()
        .any(|v| v["dataPointId"] == "measurementValid" && v["value"] == "true"));
    assert!(values
        .iter()
        .filter(|v| v["dataPointId"] != "linkBudget" && v["dataPointId"] != "measurementValid")
        .all(|v| v["value"] == 0));
}

#[test]
fn button_discovery_reports_mask_on() {
    let registry = FileRegistry::standard();
    let record = registry
        .decode(51, &hex::decode("010102").expect("hex"))
        .expect("decode button");
    let translator = from_config(&AppConfig::default(), &registry);

    let out = translator
        .translate(&record, &TranslationContext::new(0xBEEF, 10))
        .expect("translate");
    let mask = out
        .data
        .iter()
        .find(|intent| intent.topic().ends_with("/BEEF_Mask/state"))
        .expect("mask state");
    assert_eq!(mask.payload_str(), Some("ON"));
    let configs = out
        .data
        .iter()
        .filter(|intent| intent.topic().ends_with("/config"))
        .count();
    assert_eq!(configs * 2, out.data.len());
}

#[test]
fn energy_sparkplug_data_uses_schema_types() {
    let mut config = AppConfig::default();
    config.bridge.sink = SinkKind::Sparkplug;
    config.sparkplug.project_id = "p".to_owned();
    config.sparkplug.edge_node_id = "e".to_owned();
    let translator = from_config(&config, &FileRegistry::standard());

    let out = translator
        .translate(&energy_record(), &TranslationContext::new(0xA, 0))
        .expect("translate");
    let doc: Value = serde_json::from_slice(out.data[0].payload()).expect("json");
    let metrics = doc["metrics"].as_array().expect("metrics");
    assert_eq!(metrics.len(), 14);
    assert_eq!(metrics[0]["name"], "ApparentEnergyA");
    assert_eq!(metrics[0]["dataType"], "Int64");
    assert_eq!(metrics[9]["name"], "VoltageA");
    assert_eq!(metrics[9]["dataType"], "Int16");
}

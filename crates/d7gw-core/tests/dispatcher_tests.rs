//! ---
//! gw_section: "13-testing-quality-assurance"
//! gw_subsection: "integration-tests"
//! gw_type: "source"
//! gw_scope: "test"
//! gw_description: "Dispatcher ordering, dropping and metrics behaviour."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::sync::Arc;

use anyhow::Result;
use d7gw_common::{AppConfig, SinkKind};
use d7gw_core::{DispatchOutcome, DispatchPool, Dispatcher, InboundCommand};
use d7gw_files::FileRegistry;
use d7gw_msg::{BridgeMetrics, InMemoryPublisher, PublishIntent, PublishSupervisor};
use prometheus::Registry;

fn build(sink: SinkKind) -> (Arc<Dispatcher>, Arc<InMemoryPublisher>) {
    let mut config = AppConfig::default();
    config.bridge.sink = sink;
    config.sparkplug.project_id = "plant".to_owned();
    config.sparkplug.edge_node_id = "gw".to_owned();

    let registry = Arc::new(FileRegistry::standard());
    let translator = d7gw_sinks::from_config(&config, &registry);
    let publisher = Arc::new(InMemoryPublisher::new());
    let mut supervisor = PublishSupervisor::new();
    supervisor.register_publisher(publisher.clone());
    let dispatcher = Dispatcher::new(registry, translator, Arc::new(supervisor));
    (Arc::new(dispatcher), publisher)
}

fn button_press(sender: u64) -> InboundCommand {
    InboundCommand::telemetry(sender, -65, 51, vec![0x01, 0x01, 0x02])
}

#[test]
fn home_assistant_configs_precede_states_for_new_transmitter() {
    let (dispatcher, publisher) = build(SinkKind::HomeAssistant);

    let outcome = dispatcher.dispatch(&button_press(0xC0FFEE));
    assert!(outcome.is_published());
    let intents = publisher.drain();
    // three values plus link budget, config and state each
    assert_eq!(intents.len(), 8);
    let first_state = intents
        .iter()
        .position(|i| i.topic().ends_with("/state"))
        .expect("state present");
    assert!(intents[..first_state]
        .iter()
        .all(|i| i.topic().ends_with("/config")));
    assert_eq!(first_state, 4);

    let mask = intents
        .iter()
        .find(|i| i.topic() == "homeassistant/binary_sensor/C0FFEE_Mask/state")
        .expect("mask state");
    assert_eq!(mask.payload_str(), Some("ON"));

    assert_eq!(
        dispatcher.dispatch(&button_press(0xC0FFEE)),
        DispatchOutcome::Published {
            transmitter: 0xC0FFEE,
            intents: 8,
            birth: false
        }
    );
    let again = publisher.drain();
    assert_eq!(again.len(), 8);
    assert!(again[..4].iter().all(|i| i.topic().ends_with("/config")));
}

#[test]
fn home_assistant_announces_entities_of_every_file_type() {
    let (dispatcher, publisher) = build(SinkKind::HomeAssistant);

    assert!(dispatcher.dispatch(&button_press(0xAB)).is_published());
    publisher.drain();

    let mut energy = vec![0u8; 79];
    energy[78] = 1;
    let outcome = dispatcher.dispatch(&InboundCommand::telemetry(0xAB, -65, 52, energy));
    assert!(matches!(
        outcome,
        DispatchOutcome::Published { birth: false, .. }
    ));

    let topics: Vec<String> = publisher
        .drain()
        .iter()
        .map(|i| i.topic().to_owned())
        .collect();
    let states: Vec<&String> = topics.iter().filter(|t| t.ends_with("/state")).collect();
    assert_eq!(states.len(), 14);
    for state in states {
        let config = state.replace("/state", "/config");
        let config_at = topics.iter().position(|t| *t == config);
        let state_at = topics.iter().position(|t| t == state);
        assert!(config_at.is_some(), "{} never announced", state);
        assert!(config_at < state_at, "{} announced after its state", config);
    }
    assert!(topics.contains(&"homeassistant/sensor/AB_RealEnergyA/config".to_owned()));
}

#[test]
fn time_series_ignores_configuration_and_unknown_files() {
    let (dispatcher, publisher) = build(SinkKind::TimeSeries);

    let config = InboundCommand::telemetry(9, -50, 61, vec![1, 1, 0, 1]);
    assert_eq!(dispatcher.dispatch(&config), DispatchOutcome::NothingToPublish);
    let unknown = InboundCommand::telemetry(9, -50, 0xFF, vec![1, 2, 3]);
    assert_eq!(
        dispatcher.dispatch(&unknown),
        DispatchOutcome::UnknownFileType(0xFF)
    );
    assert!(publisher.is_empty());

    let mut energy = vec![0u8; 97];
    energy[78] = 1;
    let outcome = dispatcher.dispatch(&InboundCommand::telemetry(9, -50, 52, energy));
    assert!(outcome.is_published());
    let intents: Vec<PublishIntent> = publisher.drain();
    assert_eq!(intents.len(), 1);
    let doc: serde_json::Value = serde_json::from_slice(intents[0].payload()).expect("json");
    assert_eq!(doc["timeseries"][0]["values"].as_array().map(Vec::len), Some(14));
}

#[test]
fn metrics_count_drops_by_reason() -> Result<()> {
    let registry = Registry::new();
    let metrics = BridgeMetrics::register(&registry)?;
    let (dispatcher, _publisher) = build(SinkKind::Sparkplug);
    let dispatcher = Arc::try_unwrap(dispatcher)
        .map_err(|_| anyhow::anyhow!("dispatcher still shared"))?
        .with_metrics(metrics);

    dispatcher.dispatch(&InboundCommand::default());
    dispatcher.dispatch(&InboundCommand::telemetry(1, 0, 51, vec![1]));
    dispatcher.dispatch(&button_press(1));

    let families = registry.gather();
    let dropped = families
        .iter()
        .find(|f| f.get_name() == "commands_dropped_total")
        .expect("dropped family");
    assert_eq!(dropped.get_metric().len(), 2);
    let births = families
        .iter()
        .find(|f| f.get_name() == "births_emitted_total")
        .expect("births family");
    assert_eq!(births.get_metric()[0].get_counter().get_value() as u64, 1);
    Ok(())
}

#[tokio::test]
async fn pool_keeps_per_transmitter_order() -> Result<()> {
    let (dispatcher, publisher) = build(SinkKind::Sparkplug);
    let pool = DispatchPool::spawn(dispatcher.clone(), 3, 4);

    for _ in 0..5 {
        for sender in [1u64, 2, 3, 4] {
            pool.submit(button_press(sender)).await?;
        }
    }
    let summary = pool.shutdown().await;
    assert_eq!(summary.dispatched, 20);
    assert_eq!(summary.published, 20);
    assert_eq!(summary.births, 4);

    let intents = publisher.drain();
    assert_eq!(intents.len(), 24);
    for sender in ["1", "2", "3", "4"] {
        let own: Vec<_> = intents
            .iter()
            .filter(|i| i.topic().ends_with(&format!("/{}", sender)))
            .collect();
        assert_eq!(own.len(), 6);
        assert!(own[0].topic().contains("/DBIRTH/"));
        assert!(own[1..].iter().all(|i| i.topic().contains("/DDATA/")));
    }
    Ok(())
}

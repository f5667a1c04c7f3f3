//! ---
//! gw_section: "06-daemon"
//! gw_subsection: "binary"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Binary entrypoint for the gateway daemon."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use prometheus::{Registry, TextEncoder};
use tokio::signal;
use tracing::{info, warn};

use d7gw_common::{init_tracing, AppConfig, SinkKind};
use d7gw_core::{DispatchPool, Dispatcher};
use d7gw_files::FileRegistry;
use d7gw_msg::{BridgeMetrics, PublishSupervisor};

mod feed;
mod mqtt;
mod output;

use mqtt::MqttPublisher;
use output::StdoutPublisher;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "DASH7 gateway daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Default to debug logging")]
    verbose: bool,

    #[arg(long, value_enum, help = "Override the configured sink")]
    sink: Option<CliSink>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSink {
    HomeAssistant,
    TimeSeries,
    Sparkplug,
}

impl From<CliSink> for SinkKind {
    fn from(value: CliSink) -> Self {
        match value {
            CliSink::HomeAssistant => SinkKind::HomeAssistant,
            CliSink::TimeSeries => SinkKind::TimeSeries,
            CliSink::Sparkplug => SinkKind::Sparkplug,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Dispatch the command feed and publish the results")]
    Run {
        #[arg(long, help = "Print publish intents instead of connecting to the broker")]
        dry_run: bool,
    },
    #[command(about = "List the registered file types")]
    Files,
    #[command(about = "Decode a payload and print the record as JSON")]
    Decode {
        #[arg(long, help = "File type identifier")]
        file_id: u8,
        #[arg(long = "hex", value_name = "HEX", help = "Payload bytes as hex")]
        payload: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = FileRegistry::standard();

    match &cli.command {
        Some(Commands::Files) => {
            print!("{}", output::render_registry(&registry));
            Ok(())
        }
        Some(Commands::Decode { file_id, payload }) => {
            let bytes =
                hex::decode(payload.replace(' ', "")).context("payload is not valid hex")?;
            let record = registry.decode(*file_id, &bytes)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Some(Commands::Run { dry_run }) => run_daemon(&cli, registry, *dry_run).await,
        None => run_daemon(&cli, registry, false).await,
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/d7gw.toml"));
    candidates.push(PathBuf::from("/etc/d7gw/d7gw.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    if let Some(sink) = cli.sink {
        config.bridge.sink = sink.into();
        config.validate()?;
    }
    init_tracing(&config.logging, cli.verbose)?;
    info!(config_path = %loaded.source.display(), sink = %config.bridge.sink, "configuration loaded");
    Ok(config)
}

async fn run_daemon(cli: &Cli, registry: FileRegistry, dry_run: bool) -> Result<()> {
    let config = load_config(cli)?;

    let metrics_registry = Registry::new();
    let metrics = BridgeMetrics::register(&metrics_registry)?;

    let registry = Arc::new(registry);
    let translator = d7gw_sinks::from_config(&config, &registry);

    let mut supervisor = PublishSupervisor::new().with_metrics(metrics.clone());
    let mqtt = if dry_run {
        info!("dry run; intents are printed to stdout");
        supervisor.register_publisher(Arc::new(StdoutPublisher));
        None
    } else {
        let publisher = Arc::new(MqttPublisher::connect(&config.mqtt).await?);
        info!(broker = %config.mqtt.broker, port = config.mqtt.port, "publish bus ready");
        supervisor.register_publisher(publisher.clone());
        Some(publisher)
    };

    let dispatcher = Arc::new(
        Dispatcher::new(registry, translator, Arc::new(supervisor)).with_metrics(metrics),
    );
    let pool = DispatchPool::from_config(dispatcher.clone(), &config.bridge);

    tokio::select! {
        result = feed::run_feed(&config.feed.path, &pool) => {
            let summary = result?;
            info!(submitted = summary.submitted, rejected = summary.rejected, "command feed finished");
        }
        signal = signal::ctrl_c() => {
            signal?;
            info!("ctrl-c received; shutting down");
        }
    }

    let summary = pool.shutdown().await;
    let published = dispatcher.supervisor().metrics();
    info!(
        dispatched = summary.dispatched,
        transmitters = dispatcher.known_transmitters(),
        intents_sent = published.sent,
        intents_dropped = published.dropped,
        "gateway stopped"
    );

    if let Some(publisher) = mqtt {
        publisher.close().await;
    }

    match TextEncoder::new().encode_to_string(&metrics_registry.gather()) {
        Ok(exposition) => info!(metrics = %exposition, "final metrics"),
        Err(err) => warn!(error = %err, "failed to encode metrics"),
    }
    Ok(())
}

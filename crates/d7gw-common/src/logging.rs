//! ---
//! gw_section: "01-core-functionality"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Tracing bootstrap: filter selection, stdout and rolling file outputs."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
//! Tracing bootstrap for the gateway binaries.
//!
//! Events go to stdout in the configured [`LogFormat`] and, always as JSON,
//! to a daily rolling file under [`LoggingConfig::directory`].
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "D7GW_LOG";
const STANDARD_LOG_ENV: &str = "RUST_LOG";
const DEFAULT_FILE_PREFIX: &str = "d7gw";

/// Writer guards for the file and stdout workers, held for the process lifetime.
static GUARDS: OnceCell<[WorkerGuard; 2]> = OnceCell::new();

/// Stdout format. The log file is JSON either way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    StructuredJson,
    /// Human readable, with targets.
    Pretty,
}

/// Pick the filter directive: `D7GW_LOG`, then `RUST_LOG`, then `info`
/// (`debug` when verbose). Blank variables count as unset. Returns the
/// directive and the name of its source.
fn filter_directive(
    gateway: Option<String>,
    standard: Option<String>,
    verbose: bool,
) -> (String, &'static str) {
    let set = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    if let Some(directive) = set(gateway) {
        return (directive, LOG_ENV);
    }
    if let Some(directive) = set(standard) {
        return (directive, STANDARD_LOG_ENV);
    }
    let level = if verbose { "debug" } else { "info" };
    (level.to_owned(), "default")
}

fn build_filter(verbose: bool) -> EnvFilter {
    let (directive, source) = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var(STANDARD_LOG_ENV).ok(),
        verbose,
    );
    EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        let (fallback, _) = filter_directive(None, None, verbose);
        eprintln!(
            "ignoring {} filter {:?} ({}); logging at {}",
            source, directive, err, fallback
        );
        EnvFilter::new(fallback)
    })
}

/// File name handed to the daily appender, which appends the date.
pub fn log_file_name(config: &LoggingConfig) -> String {
    let prefix = config
        .file_prefix
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_FILE_PREFIX);
    format!("{}.log", prefix)
}

fn stdout_layer<S>(format: LogFormat, writer: NonBlocking) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .json()
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(writer)
            .boxed(),
    }
}

/// Install the global subscriber. A second call keeps the first subscriber.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) -> Result<()> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "unable to create log directory {}",
            config.directory.display()
        )
    })?;
    let file_name = log_file_name(config);
    let appender = RollingFileAppender::new(Rotation::DAILY, &config.directory, &file_name);
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let _ = GUARDS.set([file_guard, stdout_guard]);

    let file_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .json()
        .with_writer(file_writer);

    let installed = tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(stdout_layer(config.format, stdout_writer))
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        info!(
            log_dir = %config.directory.display(),
            file = %file_name,
            format = ?config.format,
            "tracing initialised"
        );
    } else {
        debug!("tracing subscriber already installed");
    }
    Ok(())
}

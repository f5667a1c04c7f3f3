//! ---
//! gw_section: "06-daemon"
//! gw_subsection: "binary"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Console rendering for dry runs and the inspection subcommands."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::io::Write;

use serde::Serialize;

use d7gw_files::{FileRegistry, RecordKind};
use d7gw_msg::{PublishError, PublishIntent, Publisher};

#[derive(Debug, Serialize)]
struct PrintedIntent<'a> {
    topic: &'a str,
    qos: u8,
    retain: bool,
    payload: &'a str,
}

/// Writes every intent to stdout as one JSON line instead of publishing.
#[derive(Debug, Default)]
pub struct StdoutPublisher;

impl Publisher for StdoutPublisher {
    fn publish(&self, intent: &PublishIntent) -> d7gw_msg::Result<()> {
        let payload = intent
            .payload_str()
            .map(str::to_owned)
            .unwrap_or_else(|| hex::encode(intent.payload()));
        let line = serde_json::to_string(&PrintedIntent {
            topic: intent.topic(),
            qos: intent.qos().level(),
            retain: intent.retain(),
            payload: &payload,
        })
        .map_err(|err| PublishError::Rejected {
            transport: "stdout",
            reason: err.to_string(),
        })?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line).map_err(|err| PublishError::Rejected {
            transport: "stdout",
            reason: err.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Table of registered file types.
pub fn render_registry(registry: &FileRegistry) -> String {
    let mut out = format!(
        "{:<4} {:<14} {:<13} {:>9} {:>9}  fields\n",
        "id", "name", "kind", "file_size", "allocated"
    );
    for schema in registry.schemas() {
        let kind = match schema.kind {
            RecordKind::Measurement => "measurement",
            RecordKind::Configuration => "configuration",
        };
        let fields = schema
            .fields
            .iter()
            .map(|field| field.name)
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{:<4} {:<14} {:<13} {:>9} {:>9}  {}\n",
            schema.file_id,
            schema.name,
            kind,
            schema.file_size(),
            schema.allocated_size,
            fields
        ));
    }
    out
}

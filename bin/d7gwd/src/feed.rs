//! ---
//! gw_section: "06-daemon"
//! gw_subsection: "binary"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Newline-delimited JSON command feed."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use d7gw_core::{DispatchPool, InboundCommand};

#[derive(Debug, Deserialize)]
struct FeedRecord {
    #[serde(default)]
    delay_ms: Option<u64>,
    #[serde(flatten)]
    command: InboundCommand,
}

/// Totals for one pass over the feed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    pub submitted: usize,
    pub rejected: usize,
}

/// Read commands from `path` (`-` for stdin) until end of input.
pub async fn run_feed(path: &Path, pool: &DispatchPool) -> Result<FeedSummary> {
    if path.as_os_str() == "-" {
        info!("reading commands from stdin");
        forward_lines(BufReader::new(tokio::io::stdin()), pool).await
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("unable to open command feed {}", path.display()))?;
        info!(feed = %path.display(), "reading commands from file");
        forward_lines(BufReader::new(file), pool).await
    }
}

/// Submit every parseable line to the pool. Lines that are not valid
/// commands are logged and skipped.
pub async fn forward_lines<R>(reader: R, pool: &DispatchPool) -> Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: FeedRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping unparseable command");
                summary.rejected += 1;
                continue;
            }
        };
        if let Some(delay) = record.delay_ms {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        pool.submit(record.command).await?;
        summary.submitted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use d7gw_common::TimeSeriesConfig;
    use d7gw_core::Dispatcher;
    use d7gw_files::FileRegistry;
    use d7gw_msg::{InMemoryPublisher, PublishSupervisor};
    use d7gw_sinks::TimeSeriesTranslator;

    #[tokio::test]
    async fn feed_lines_reach_the_pool() {
        let publisher = Arc::new(InMemoryPublisher::new());
        let mut supervisor = PublishSupervisor::new();
        supervisor.register_publisher(publisher.clone());
        let translator = Arc::new(TimeSeriesTranslator::new(TimeSeriesConfig {
            topic: "ts".to_owned(),
        }));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(FileRegistry::standard()),
            translator,
            Arc::new(supervisor),
        ));
        let pool = DispatchPool::spawn(dispatcher, 2, 8);

        let feed = concat!(
            "{\"sender_id\": 1, \"link_budget\": -70, \"file_id\": 51, \"payload\": \"010102\"}\n",
            "\n",
            "not json\n",
            "{\"delay_ms\": 1, \"sender_id\": 2, \"link_budget\": -60}\n",
        );
        let summary = forward_lines(feed.as_bytes(), &pool).await.expect("feed");
        assert_eq!(
            summary,
            FeedSummary {
                submitted: 2,
                rejected: 1
            }
        );

        let totals = pool.shutdown().await;
        assert_eq!(totals.published, 1);
        assert_eq!(totals.dropped, 1);
        assert_eq!(publisher.len(), 1);
    }
}

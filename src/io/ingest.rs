//! Check-in ingest - reads newline-delimited JSON check-ins
//!
//! One JSON object per line, as produced by the transport layer's
//! capture. Malformed lines are logged and skipped rather than aborting
//! the replay; the channel closing downstream ends the feed early.

use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::types::CheckInEvent;

/// Reads check-in events from a file into a channel
pub struct CheckInFeed {
    path: String,
}

impl CheckInFeed {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_string() }
    }

    /// Feed every parseable line to `tx` until EOF or receiver drop
    pub async fn run(self, tx: mpsc::Sender<CheckInEvent>) -> anyhow::Result<()> {
        let file = File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open check-in file {}", self.path))?;
        let mut lines = BufReader::new(file).lines();

        let mut sent = 0u64;
        let mut skipped = 0u64;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<CheckInEvent>(line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        // Receiver gone, stop reading
                        break;
                    }
                    sent += 1;
                }
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "checkin_parse_failed");
                }
            }
        }

        info!(file = %self.path, sent = %sent, skipped = %skipped, "ingest_complete");
        Ok(())
    }
}

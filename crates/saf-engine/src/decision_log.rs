//! Best-effort CSV log of scored offers
//!
//! Records go through a bounded channel to a background writer task. When
//! the channel is full or the writer is gone the record is dropped; logging
//! never delays or fails a prediction.

use crate::observability::EngineMetrics;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Header of the decision log file
pub const CSV_HEADER: &str = "tier,premium,saf_miles,chose_saf";

/// Default channel capacity
pub const DEFAULT_CAPACITY: usize = 1024;

/// One scored offer as written to the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub tier: String,
    pub premium: f64,
    pub saf_miles: u64,
    pub chose_saf: bool,
}

impl DecisionRecord {
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            csv_field(&self.tier),
            self.premium,
            self.saf_miles,
            u8::from(self.chose_saf)
        )
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Sending half of the decision log
#[derive(Clone)]
pub struct DecisionLog {
    sender: Option<mpsc::Sender<DecisionRecord>>,
    metrics: EngineMetrics,
}

impl DecisionLog {
    /// A log that discards every record
    pub fn disabled() -> Self {
        Self {
            sender: None,
            metrics: EngineMetrics::new(),
        }
    }

    /// Start the writer task; must be called inside a tokio runtime
    pub fn spawn(path: impl Into<PathBuf>, capacity: usize, metrics: EngineMetrics) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(write_loop(path.into(), receiver));
        (
            Self {
                sender: Some(sender),
                metrics,
            },
            handle,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a record without waiting
    pub fn record(&self, record: DecisionRecord) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(e) = sender.try_send(record) {
            self.metrics.inc_decision_log_dropped();
            warn!(error = %e, "Decision log record dropped");
        }
    }
}

/// Wait for a writer task to finish once every sender is dropped.
///
/// Returns false, after logging, when the task panicked or was cancelled.
pub async fn join_writer(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Decision log writer terminated abnormally");
            false
        }
    }
}

async fn write_loop(path: PathBuf, mut receiver: mpsc::Receiver<DecisionRecord>) {
    while let Some(record) = receiver.recv().await {
        if let Err(e) = append(&path, &record).await {
            warn!(path = %path.display(), error = %e, "Failed to append decision log record");
        }
    }
    debug!(path = %path.display(), "Decision log writer stopped");
}

async fn append(path: &Path, record: &DecisionRecord) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let mut buf = String::new();
    if file.metadata().await?.len() == 0 {
        buf.push_str(CSV_HEADER);
        buf.push('\n');
    }
    buf.push_str(&record.to_csv_line());
    buf.push('\n');

    file.write_all(buf.as_bytes()).await?;
    file.flush().await
}

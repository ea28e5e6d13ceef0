//! Append-only alert log, one JSON object per line.

use std::path::{Path, PathBuf};

use serde::Serialize;
use simwatch_core::{Alert, AlertLevel, Tags};
use tokio::io::AsyncWriteExt;

use crate::traits::{AlertSink, NotifyError};

/// One line of the alert log.
#[derive(Debug, Serialize)]
struct AlertRecord<'a> {
    timestamp: String,
    level: AlertLevel,
    rule: &'a str,
    measurement: &'a str,
    value: f64,
    threshold: f64,
    message: &'a str,
    tags: &'a Tags,
}

impl<'a> From<&'a Alert> for AlertRecord<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self {
            timestamp: alert.timestamp.to_rfc3339(),
            level: alert.level,
            rule: &alert.rule_name,
            measurement: &alert.measurement,
            value: alert.current_value,
            threshold: alert.threshold,
            message: &alert.message,
            tags: &alert.tags,
        }
    }
}

/// Appends alerts to a file. The file is opened in append mode for every
/// alert and never truncated.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl AlertSink for JsonlSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        let mut line = serde_json::to_string(&AlertRecord::from(alert))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "jsonl"
    }
}

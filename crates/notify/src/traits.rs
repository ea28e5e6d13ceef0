//! Sink trait and shared error types.

use simwatch_core::Alert;
use simwatch_storage::StoreError;

/// Errors that can occur while delivering an alert to one sink.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store write failed: {0}")]
    Store(#[from] StoreError),
}

/// A delivery target for fired alerts.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert.
    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError>;

    /// Human-readable name for this sink (e.g., "console", "jsonl").
    fn sink_name(&self) -> &str;
}

/// Result of delivering an alert to a single sink.
#[derive(Debug)]
pub struct DispatchResult {
    pub sink: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

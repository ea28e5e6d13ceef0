//! Human-readable alert rendering on stdout.

use simwatch_core::{Alert, AlertLevel};

use crate::traits::{AlertSink, NotifyError};

/// Prints each alert as a short block.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

fn marker(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Info => "INFO",
        AlertLevel::Warning => "WARN",
        AlertLevel::Critical => "CRIT",
    }
}

/// Render the block printed for `alert`.
pub fn render_console(alert: &Alert) -> String {
    let mut out = format!(
        "[{}] {}\nrule:        {}\nmeasurement: {}\nvalue:       {:.2} (threshold: {:.2})\nmessage:     {}\n",
        marker(alert.level),
        alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
        alert.rule_name,
        alert.measurement,
        alert.current_value,
        alert.threshold,
        alert.message,
    );
    if !alert.tags.is_empty() {
        let tags: Vec<String> = alert.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(&format!("tags:        {}\n", tags.join(", ")));
    }
    out.push_str(&"-".repeat(60));
    out
}

#[async_trait::async_trait]
impl AlertSink for ConsoleSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        println!("\n{}", render_console(alert));
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "console"
    }
}

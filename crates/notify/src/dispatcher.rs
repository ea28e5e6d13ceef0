//! Delivers each alert to every configured sink, in order.
//!
//! Individual sink failures are logged and recorded in the result; they
//! never prevent the remaining sinks from running.

use simwatch_core::Alert;

use crate::traits::{AlertSink, DispatchResult};

/// Ordered list of sinks shared by all rules.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    /// Append a sink; it runs after the ones already registered.
    pub fn add_sink(&mut self, sink: Box<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.sink_name()).collect()
    }

    /// Deliver `alert` to all sinks. Returns one result per sink.
    pub async fn dispatch(&self, alert: &Alert) -> Vec<DispatchResult> {
        if self.sinks.is_empty() {
            tracing::debug!(rule = %alert.rule_name, "No alert sinks configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.sinks.len());

        for sink in &self.sinks {
            let start = std::time::Instant::now();
            let result = sink.deliver(alert).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::debug!(
                        rule = %alert.rule_name,
                        sink = sink.sink_name(),
                        duration_ms,
                        "Alert delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        rule = %alert.rule_name,
                        sink = sink.sink_name(),
                        error = %e,
                        duration_ms,
                        "Alert delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                sink: sink.sink_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}

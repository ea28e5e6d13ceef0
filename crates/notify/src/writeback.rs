//! Stores fired alerts as points so they can be queried like any series.

use std::sync::Arc;

use simwatch_core::{Alert, MetricPoint};
use simwatch_storage::MetricStore;

use crate::traits::{AlertSink, NotifyError};

pub const ALERTS_MEASUREMENT: &str = "System_Alerts";

/// Point written for `alert`. The series tags are copied first so the
/// `level` and `rule` tags always win a name clash.
pub fn alert_to_point(alert: &Alert) -> MetricPoint {
    let ts = alert
        .timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| alert.timestamp.timestamp() * 1_000_000_000);

    MetricPoint::new(ALERTS_MEASUREMENT, ts)
        .with_tags(&alert.tags)
        .with_tag("level", alert.level.to_string())
        .with_tag("rule", alert.rule_name.clone())
        .with_field("measurement_name", alert.measurement.clone())
        .with_field("value", alert.current_value)
        .with_field("threshold", alert.threshold)
        .with_field("message", alert.message.clone())
}

/// Writes each alert back to the metric store.
pub struct StoreSink {
    store: Arc<dyn MetricStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn MetricStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl AlertSink for StoreSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.store.write_points(&[alert_to_point(alert)]).await?;
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "store"
    }
}

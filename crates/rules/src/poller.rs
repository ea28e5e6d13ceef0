//! Fixed-interval evaluation loop.

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::info;

use simwatch_notify::Dispatcher;

use crate::engine::RuleEngine;

/// Owns the engine and drives it on a timer. Cycles run one at a time:
/// a tick that arrives while a cycle is still running is skipped.
pub struct Poller {
    engine: RuleEngine,
    dispatcher: Dispatcher,
    interval: Duration,
}

impl Poller {
    pub fn new(engine: RuleEngine, dispatcher: Dispatcher, interval: Duration) -> Self {
        Self {
            engine,
            dispatcher,
            interval,
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Run one cycle and dispatch its alerts. Returns the number fired.
    pub async fn poll_once(&mut self) -> usize {
        let alerts = self.engine.run_cycle(Utc::now()).await;
        for alert in &alerts {
            self.dispatcher.dispatch(alert).await;
        }
        alerts.len()
    }

    /// Poll forever. Cancel by dropping the future.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.interval.as_secs(),
            rules = self.engine.enabled_rules(),
            sinks = ?self.dispatcher.sink_names(),
            "threshold monitoring started"
        );

        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let fired = self.poll_once().await;
            if fired > 0 {
                info!(alerts = fired, "poll cycle raised alerts");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use simwatch_core::{Alert, AlertLevel, MetricPoint};
    use simwatch_notify::{AlertSink, NotifyError};
    use simwatch_storage::{MemoryStore, MetricStore};

    use super::*;
    use crate::schema::{Comparator, RuleSpec, ThresholdRule};

    struct CountingSink(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl AlertSink for CountingSink {
        async fn deliver(&self, _alert: &Alert) -> Result<(), NotifyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn sink_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn poll_once_dispatches_fired_alerts() {
        let store = Arc::new(MemoryStore::new());
        store
            .write_points(&[MetricPoint::new("active_ue_count", 1)
                .with_tag("cell_id", "2")
                .with_field("value", 25.0)])
            .await
            .unwrap();

        let rule = ThresholdRule::try_from(RuleSpec::new(
            "overload",
            "^active_ue_count$",
            20.0,
            Comparator::Gt,
            AlertLevel::Warning,
            "cell {{ cell_id }}: {{ value|round }} UEs",
        ))
        .unwrap();

        let delivered = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(vec![Box::new(CountingSink(delivered.clone()))]);
        let mut poller = Poller::new(
            RuleEngine::new(vec![rule], store),
            dispatcher,
            Duration::from_secs(10),
        );

        assert_eq!(poller.poll_once().await, 1);
        assert_eq!(delivered.load(Ordering::SeqCst), 1);

        // Default cooldown is 60s.
        assert_eq!(poller.poll_once().await, 0);
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(poller.engine().rules().len(), 1);
    }
}

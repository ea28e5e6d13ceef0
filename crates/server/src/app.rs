//! Component wiring: store, ingestion, rules and sinks from a [`Config`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use simwatch_core::config::MonitorConfig;
use simwatch_core::Config;
use simwatch_ingest::{IngestionSession, TraceWatcher};
use simwatch_notify::{ConsoleSink, Dispatcher, JsonlSink, StoreSink};
use simwatch_rules::{default_rules, load_rules_file, Poller, RuleEngine, ThresholdRule};
use simwatch_storage::{InfluxStore, MemoryStore, MetricStore};

/// Open the metric store. `dry_run` keeps everything in memory.
pub async fn open_store(config: &Config, dry_run: bool) -> anyhow::Result<Arc<dyn MetricStore>> {
    if dry_run {
        info!("dry run: points are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = InfluxStore::new(&config.influx).context("failed to build InfluxDB client")?;
    store
        .ensure_database()
        .await
        .with_context(|| format!("InfluxDB not reachable at {}", config.influx.base_url()))?;
    Ok(Arc::new(store))
}

/// Rules from the configured file, or the built-in set.
pub fn load_rules(config: &Config) -> anyhow::Result<Vec<ThresholdRule>> {
    match &config.monitor.rules_file {
        Some(path) => load_rules_file(path)
            .with_context(|| format!("failed to load rules from {}", path.display())),
        None => Ok(default_rules(config.watch.naming)),
    }
}

/// Console, alert log and store write-back, in that order.
pub fn build_dispatcher(monitor: &MonitorConfig, store: Arc<dyn MetricStore>) -> Dispatcher {
    Dispatcher::new(vec![
        Box::new(ConsoleSink::new()),
        Box::new(JsonlSink::new(&monitor.alert_log_path)),
        Box::new(StoreSink::new(store)),
    ])
}

pub fn start_watcher(config: &Config, store: Arc<dyn MetricStore>) -> anyhow::Result<TraceWatcher> {
    let dir = &config.watch.trace_dir;
    anyhow::ensure!(dir.is_dir(), "trace directory {} does not exist", dir.display());
    let session = IngestionSession::new(store, config.watch.naming);
    TraceWatcher::start(dir, session)
        .with_context(|| format!("failed to watch {}", dir.display()))
}

pub fn build_poller(config: &Config, store: Arc<dyn MetricStore>) -> anyhow::Result<Poller> {
    let rules = load_rules(config)?;
    for rule in &rules {
        info!(
            rule = %rule.name,
            pattern = %rule.pattern,
            comparator = %rule.comparator,
            threshold = rule.threshold,
            level = %rule.level,
            enabled = rule.enabled,
            "registered rule"
        );
    }
    let dispatcher = build_dispatcher(&config.monitor, store.clone());
    let engine = RuleEngine::new(rules, store);
    Ok(Poller::new(
        engine,
        dispatcher,
        Duration::from_secs(config.monitor.interval_secs),
    ))
}

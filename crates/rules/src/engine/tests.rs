use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use regex::Regex;

use simwatch_core::{AlertLevel, MetricPoint, SeriesValue, Tags};
use simwatch_storage::{MemoryStore, MetricStore, StoreError};

use super::*;
use crate::schema::{Comparator, RuleSpec};

fn rule(consecutive: u32, cooldown: u64) -> ThresholdRule {
    ThresholdRule::try_from(RuleSpec {
        consecutive_violations: consecutive,
        cooldown_seconds: cooldown,
        ..RuleSpec::new(
            "low_sinr",
            ".*SINR.*",
            -5.0,
            Comparator::Lt,
            AlertLevel::Warning,
            "{{ measurement }} = {{ value|round(1) }}",
        )
    })
    .unwrap()
}

fn series(value: f64) -> SeriesValue {
    SeriesValue {
        measurement: "Serv_SINR_cell_3".into(),
        tags: Tags::from([("ue_id".to_string(), "111".to_string())]),
        value,
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
}

fn engine_with(rules: Vec<ThresholdRule>) -> RuleEngine {
    RuleEngine::new(rules, Arc::new(MemoryStore::new()))
}

#[test]
fn fires_once_after_second_consecutive_violation() {
    let mut engine = engine_with(vec![rule(2, 30)]);
    let key = series(0.0).series_key();

    let first = engine.observe("low_sinr", &series(-6.0), t0()).unwrap();
    assert!(first.is_none());
    assert_eq!(engine.state("low_sinr", &key).unwrap().count, 1);

    let second = engine
        .observe("low_sinr", &series(-7.0), t0() + Duration::seconds(10))
        .unwrap()
        .expect("second violation fires");
    assert_eq!(second.message, "Serv_SINR_cell_3 = -7.0");
    assert_eq!(second.level, AlertLevel::Warning);
    assert_eq!(second.tags.get("ue_id").map(String::as_str), Some("111"));
    assert_eq!(engine.state("low_sinr", &key).unwrap().count, 0);

    let third = engine
        .observe("low_sinr", &series(-3.0), t0() + Duration::seconds(20))
        .unwrap();
    assert!(third.is_none());
    assert_eq!(engine.state("low_sinr", &key).unwrap().count, 0);
}

#[test]
fn non_violation_resets_the_count() {
    let mut engine = engine_with(vec![rule(3, 0)]);
    let mut now = t0();
    for value in [-6.0, -6.0, -1.0, -6.0, -6.0] {
        assert!(engine.observe("low_sinr", &series(value), now).unwrap().is_none());
        now += Duration::seconds(10);
    }
    assert!(engine.observe("low_sinr", &series(-6.0), now).unwrap().is_some());
}

#[test]
fn cooldown_blocks_until_elapsed() {
    let mut engine = engine_with(vec![rule(1, 30)]);
    let at = |secs| t0() + Duration::seconds(secs);

    assert!(engine.observe("low_sinr", &series(-6.0), at(0)).unwrap().is_some());
    assert!(engine.observe("low_sinr", &series(-6.0), at(10)).unwrap().is_none());
    assert!(engine.observe("low_sinr", &series(-6.0), at(29)).unwrap().is_none());
    assert!(engine.observe("low_sinr", &series(-6.0), at(30)).unwrap().is_some());
}

#[test]
fn sustained_violation_must_rearm_after_firing() {
    let mut engine = engine_with(vec![rule(2, 0)]);
    let fired: Vec<bool> = (0..6)
        .map(|i| {
            engine
                .observe("low_sinr", &series(-8.0), t0() + Duration::seconds(i * 10))
                .unwrap()
                .is_some()
        })
        .collect();
    assert_eq!(fired, vec![false, true, false, true, false, true]);
}

#[test]
fn series_are_tracked_independently() {
    let mut engine = engine_with(vec![rule(2, 0)]);
    let other = SeriesValue {
        tags: Tags::from([("ue_id".to_string(), "222".to_string())]),
        ..series(-6.0)
    };

    engine.observe("low_sinr", &series(-6.0), t0()).unwrap();
    assert!(engine.observe("low_sinr", &other, t0()).unwrap().is_none());
    assert!(engine.observe("low_sinr", &series(-6.0), t0()).unwrap().is_some());
}

#[test]
fn unknown_rule_is_an_error() {
    let mut engine = engine_with(vec![rule(1, 0)]);
    assert!(matches!(
        engine.observe("nope", &series(-6.0), t0()),
        Err(RuleError::UnknownRule(_))
    ));
}

#[test]
fn template_error_keeps_the_pair_armed() {
    let bad = ThresholdRule::try_from(RuleSpec::new(
        "needs_layer",
        ".*",
        0.0,
        Comparator::Lt,
        AlertLevel::Info,
        "{{ layer }}",
    ))
    .unwrap();
    let mut engine = engine_with(vec![bad]);

    let err = engine.observe("needs_layer", &series(-1.0), t0()).unwrap_err();
    assert!(matches!(err, RuleError::Template(_)));
    let state = engine.state("needs_layer", &series(0.0).series_key()).unwrap();
    assert_eq!(state.count, 1);
    assert!(state.last_alert_at.is_none());
}

async fn write_sinr(store: &MemoryStore, ts: i64, value: f64) {
    let point = MetricPoint::new("Serv_SINR_cell_3", ts)
        .with_tag("ue_id", "111")
        .with_field("value", value);
    store.write_points(&[point]).await.unwrap();
}

#[tokio::test]
async fn poll_scenario_against_store() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = RuleEngine::new(vec![rule(2, 30)], store.clone());

    let mut fired = Vec::new();
    for (i, value) in [-6.0, -7.0, -3.0].into_iter().enumerate() {
        write_sinr(&store, i as i64 + 1, value).await;
        let now = t0() + Duration::seconds(i as i64 * 10);
        fired.push(engine.run_cycle(now).await.len());
    }
    assert_eq!(fired, vec![0, 1, 0]);
}

#[tokio::test]
async fn disabled_rule_is_not_queried() {
    let store = Arc::new(MemoryStore::new());
    write_sinr(&store, 1, -20.0).await;
    let disabled = ThresholdRule {
        enabled: false,
        ..rule(1, 0)
    };
    let mut engine = RuleEngine::new(vec![disabled], store);
    assert!(engine.check_rule("low_sinr", t0()).await.unwrap().is_empty());
    assert_eq!(engine.enabled_rules(), 0);
}

struct FailingQueries;

#[async_trait]
impl MetricStore for FailingQueries {
    async fn write_points(&self, _points: &[MetricPoint]) -> std::result::Result<(), StoreError> {
        Ok(())
    }

    async fn last_values(
        &self,
        _pattern: &Regex,
        _field: &str,
    ) -> std::result::Result<Vec<SeriesValue>, StoreError> {
        Err(StoreError::Query("connection refused".into()))
    }
}

#[tokio::test]
async fn store_failure_surfaces_from_check_rule() {
    let mut engine = RuleEngine::new(vec![rule(1, 0)], Arc::new(FailingQueries));
    assert!(matches!(
        engine.check_rule("low_sinr", t0()).await,
        Err(RuleError::Store(_))
    ));
    assert!(engine.run_cycle(t0()).await.is_empty());
}

#[tokio::test]
async fn failing_rule_does_not_stop_the_cycle() {
    let store = Arc::new(MemoryStore::new());
    write_sinr(&store, 1, -20.0).await;

    let broken = ThresholdRule::try_from(RuleSpec::new(
        "broken",
        ".*SINR.*",
        0.0,
        Comparator::Lt,
        AlertLevel::Critical,
        "{{ missing_tag }}",
    ))
    .unwrap();
    let mut engine = RuleEngine::new(vec![broken, rule(1, 0)], store);

    let alerts = engine.run_cycle(t0()).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].rule_name, "low_sinr");
    assert_eq!(alerts[0].current_value, -20.0);
}

#[tokio::test]
async fn template_error_on_one_series_does_not_drop_the_others() {
    let store = Arc::new(MemoryStore::new());
    let points = [
        MetricPoint::new("m_a", 1)
            .with_tag("ue_id", "1")
            .with_field("value", -9.0),
        MetricPoint::new("m_b", 1)
            .with_tag("cell_id", "2")
            .with_field("value", -9.0),
    ];
    store.write_points(&points).await.unwrap();

    let per_ue = ThresholdRule::try_from(RuleSpec::new(
        "per_ue",
        "^m_",
        0.0,
        Comparator::Lt,
        AlertLevel::Warning,
        "ue {{ ue_id }}",
    ))
    .unwrap();
    let mut engine = RuleEngine::new(vec![per_ue], store);

    let alerts = engine.check_rule("per_ue", t0()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].measurement, "m_a");
    assert_eq!(alerts[0].message, "ue 1");

    let ue_key = SeriesValue {
        measurement: "m_a".into(),
        tags: Tags::from([("ue_id".to_string(), "1".to_string())]),
        value: 0.0,
    }
    .series_key();
    assert_eq!(engine.state("per_ue", &ue_key).unwrap().last_alert_at, Some(t0()));

    let cell_key = SeriesValue {
        measurement: "m_b".into(),
        tags: Tags::from([("cell_id".to_string(), "2".to_string())]),
        value: 0.0,
    }
    .series_key();
    let cell_state = engine.state("per_ue", &cell_key).unwrap();
    assert_eq!(cell_state.count, 1);
    assert!(cell_state.last_alert_at.is_none());
}

//! Per-series threshold evaluation with hysteresis and cooldown.
//!
//! Every (rule, series) pair is its own state machine. A violating
//! observation increments the pair's count; any other observation resets
//! it. An alert fires when the count reaches the rule's
//! `consecutive_violations` and the cooldown since the pair's last alert
//! has elapsed. Firing resets the count, so a sustained violation has to
//! accumulate `consecutive_violations` observations again before the next
//! alert.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use simwatch_core::{Alert, SeriesValue};
use simwatch_storage::MetricStore;

use crate::error::{Result, RuleError};
use crate::schema::ThresholdRule;
use crate::template::render_message;

/// Field whose last value is compared against rule thresholds.
pub const VALUE_FIELD: &str = "value";

/// Violation bookkeeping for one (rule, series) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationState {
    pub count: u32,
    pub last_alert_at: Option<DateTime<Utc>>,
}

impl ViolationState {
    fn cooldown_elapsed(&self, cooldown_seconds: u64, now: DateTime<Utc>) -> bool {
        match self.last_alert_at {
            None => true,
            Some(last) => {
                let cooldown = i64::try_from(cooldown_seconds).unwrap_or(i64::MAX);
                now.signed_duration_since(last).num_seconds() >= cooldown
            }
        }
    }
}

fn state_key(rule: &ThresholdRule, series: &SeriesValue) -> String {
    format!("{}:{}", rule.name, series.series_key())
}

/// Evaluates a fixed rule set against the store.
///
/// Not `Sync`-shared: the engine is owned by a single poll loop, which is
/// what keeps the state map consistent without locking.
pub struct RuleEngine {
    rules: Vec<ThresholdRule>,
    store: Arc<dyn MetricStore>,
    states: HashMap<String, ViolationState>,
}

impl RuleEngine {
    pub fn new(rules: Vec<ThresholdRule>, store: Arc<dyn MetricStore>) -> Self {
        Self {
            rules,
            store,
            states: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn enabled_rules(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }

    /// State of one (rule, series) pair, if it has been observed.
    pub fn state(&self, rule_name: &str, series_key: &str) -> Option<&ViolationState> {
        self.states.get(&format!("{rule_name}:{series_key}"))
    }

    fn rule_index(&self, rule_name: &str) -> Result<usize> {
        self.rules
            .iter()
            .position(|r| r.name == rule_name)
            .ok_or_else(|| RuleError::UnknownRule(rule_name.to_string()))
    }

    /// Feed one observation of `series` to the named rule's state machine.
    ///
    /// Returns the alert if this observation fires. On a template error the
    /// count is left as is, so the alert is retried on the next violation.
    pub fn observe(
        &mut self,
        rule_name: &str,
        series: &SeriesValue,
        now: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        let idx = self.rule_index(rule_name)?;
        observe_series(&mut self.states, &self.rules[idx], series, now)
    }

    /// Query the store for the named rule and evaluate every matched series.
    /// Disabled rules yield nothing and do not touch the store. A series
    /// whose message fails to render is logged and skipped.
    pub async fn check_rule(&mut self, rule_name: &str, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let idx = self.rule_index(rule_name)?;
        self.check_rule_at(idx, now).await
    }

    async fn check_rule_at(&mut self, idx: usize, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let rule = &self.rules[idx];
        if !rule.enabled {
            return Ok(Vec::new());
        }

        let series = self.store.last_values(&rule.pattern, VALUE_FIELD).await?;
        debug!(rule = %rule.name, matched = series.len(), "evaluating rule");

        let mut alerts = Vec::new();
        for s in &series {
            match observe_series(&mut self.states, rule, s, now) {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        rule = %rule.name,
                        series = %s.series_key(),
                        error = %e,
                        "series evaluation failed"
                    );
                }
            }
        }
        Ok(alerts)
    }

    /// Evaluate every enabled rule once. A failing rule is logged and
    /// skipped; the remaining rules are still evaluated.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for idx in 0..self.rules.len() {
            match self.check_rule_at(idx, now).await {
                Ok(fired) => alerts.extend(fired),
                Err(e) => {
                    warn!(rule = %self.rules[idx].name, error = %e, "rule evaluation failed");
                }
            }
        }
        alerts
    }
}

fn observe_series(
    states: &mut HashMap<String, ViolationState>,
    rule: &ThresholdRule,
    series: &SeriesValue,
    now: DateTime<Utc>,
) -> Result<Option<Alert>> {
    let state = states.entry(state_key(rule, series)).or_default();

    if !rule.violated(series.value) {
        state.count = 0;
        return Ok(None);
    }

    state.count = state.count.saturating_add(1);
    if state.count < rule.consecutive_violations
        || !state.cooldown_elapsed(rule.cooldown_seconds, now)
    {
        return Ok(None);
    }

    let message = render_message(
        &rule.message_template,
        &series.measurement,
        series.value,
        rule.threshold,
        &series.tags,
    )?;

    state.count = 0;
    state.last_alert_at = Some(now);

    info!(
        rule = %rule.name,
        level = %rule.level,
        measurement = %series.measurement,
        value = series.value,
        "threshold alert fired"
    );

    Ok(Some(Alert {
        timestamp: now,
        rule_name: rule.name.clone(),
        level: rule.level,
        measurement: series.measurement.clone(),
        current_value: series.value,
        threshold: rule.threshold,
        message,
        tags: series.tags.clone(),
    }))
}

#[cfg(test)]
mod tests;

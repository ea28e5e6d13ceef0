//! Rule definitions: the serde-facing [`RuleSpec`] and the validated,
//! immutable [`ThresholdRule`] the engine evaluates.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use simwatch_core::AlertLevel;

use crate::error::RuleError;
use crate::template::validate_template;

/// Comparison applied as `value <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Comparator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl Comparator {
    /// Whether `value` violates `threshold` under this comparator.
    /// NaN never violates.
    pub fn violated(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gt => value > threshold,
            Comparator::Lt => value < threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Le => value <= threshold,
            Comparator::Eq => value == threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" | "gt" => Ok(Self::Gt),
            "<" | "lt" => Ok(Self::Lt),
            ">=" | "gte" => Ok(Self::Ge),
            "<=" | "lte" => Ok(Self::Le),
            "==" | "eq" => Ok(Self::Eq),
            other => Err(format!("unknown comparator: {other}")),
        }
    }
}

impl TryFrom<String> for Comparator {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Comparator> for String {
    fn from(c: Comparator) -> Self {
        c.symbol().to_string()
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn default_cooldown() -> u64 {
    60
}

fn default_consecutive() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

/// A rule as written in a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    /// Regex matched against measurement names.
    pub measurement_pattern: String,
    pub threshold: f64,
    pub comparator: Comparator,
    pub level: AlertLevel,
    pub message_template: String,
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_consecutive")]
    pub consecutive_violations: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RuleSpec {
    /// A spec with the optional fields at their defaults.
    pub fn new(
        name: impl Into<String>,
        measurement_pattern: impl Into<String>,
        threshold: f64,
        comparator: Comparator,
        level: AlertLevel,
        message_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            measurement_pattern: measurement_pattern.into(),
            threshold,
            comparator,
            level,
            message_template: message_template.into(),
            cooldown_seconds: default_cooldown(),
            consecutive_violations: default_consecutive(),
            enabled: default_enabled(),
        }
    }
}

/// A validated rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    pub name: String,
    pub pattern: Regex,
    pub threshold: f64,
    pub comparator: Comparator,
    pub level: AlertLevel,
    pub message_template: String,
    pub cooldown_seconds: u64,
    /// Always at least 1.
    pub consecutive_violations: u32,
    pub enabled: bool,
}

impl TryFrom<RuleSpec> for ThresholdRule {
    type Error = RuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        if spec.name.trim().is_empty() {
            return Err(RuleError::Validation("rule name must not be empty".into()));
        }
        if spec.consecutive_violations == 0 {
            return Err(RuleError::Validation(format!(
                "rule '{}': consecutive_violations must be at least 1",
                spec.name
            )));
        }
        if !spec.threshold.is_finite() {
            return Err(RuleError::Validation(format!(
                "rule '{}': threshold must be finite",
                spec.name
            )));
        }
        let pattern = Regex::new(&spec.measurement_pattern).map_err(|e| {
            RuleError::Validation(format!("rule '{}': invalid pattern: {e}", spec.name))
        })?;
        validate_template(&spec.message_template)?;

        Ok(Self {
            name: spec.name,
            pattern,
            threshold: spec.threshold,
            comparator: spec.comparator,
            level: spec.level,
            message_template: spec.message_template,
            cooldown_seconds: spec.cooldown_seconds,
            consecutive_violations: spec.consecutive_violations,
            enabled: spec.enabled,
        })
    }
}

impl ThresholdRule {
    pub fn violated(&self, value: f64) -> bool {
        self.comparator.violated(value, self.threshold)
    }
}

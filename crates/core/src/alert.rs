use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::point::Tags;

/// Severity attached to a threshold rule and every alert it raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "info"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

/// A fired threshold alert. Built once by the rule engine and handed to the
/// dispatcher; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub rule_name: String,
    pub level: AlertLevel,
    pub measurement: String,
    pub current_value: f64,
    pub threshold: f64,
    pub message: String,
    pub tags: Tags,
}

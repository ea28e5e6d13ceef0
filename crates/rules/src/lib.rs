//! Threshold rule engine.
//!
//! This crate provides:
//! - Rule schema with serde deserialization and closed comparator/level variants
//! - YAML rule file loader and the built-in default rule set
//! - Minijinja message templates rendered per alert
//! - Per-series violation/cooldown state machine ([`RuleEngine`])
//! - Fixed-interval [`Poller`] feeding fired alerts to a dispatcher

pub mod defaults;
pub mod engine;
pub mod error;
pub mod loader;
pub mod poller;
pub mod schema;
pub mod template;

pub use defaults::default_rules;
pub use engine::{RuleEngine, ViolationState};
pub use error::{Result, RuleError};
pub use loader::{load_rules_file, parse_rules};
pub use poller::Poller;
pub use schema::{Comparator, RuleSpec, ThresholdRule};
pub use template::render_message;

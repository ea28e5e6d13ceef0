//! Alert message templates.
//!
//! Templates are minijinja strings rendered against the matched series:
//! `measurement`, `value`, `threshold`, and every tag of the series as a
//! top-level variable. Undefined variables are an error, so a template
//! naming a tag the series lacks fails at render time instead of
//! producing a blank.

use std::collections::BTreeMap;

use minijinja::{Environment, UndefinedBehavior, Value};

use simwatch_core::Tags;

use crate::error::RuleError;

fn build_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_filter("round", round_filter);
    env
}

/// Format a float with a fixed number of decimals (default 0).
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}

/// Render `template` for one matched series.
pub fn render_message(
    template: &str,
    measurement: &str,
    value: f64,
    threshold: f64,
    tags: &Tags,
) -> Result<String, RuleError> {
    let mut ctx: BTreeMap<String, Value> = tags
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    ctx.insert("measurement".into(), Value::from(measurement));
    ctx.insert("value".into(), Value::from(value));
    ctx.insert("threshold".into(), Value::from(threshold));

    build_env()
        .render_str(template, ctx)
        .map_err(|e| RuleError::Template(e.to_string()))
}

/// Check that a template parses. Does not evaluate it.
pub fn validate_template(template: &str) -> Result<(), RuleError> {
    let env = build_env();
    env.template_from_str(template)
        .map_err(|e| RuleError::Template(e.to_string()))?;
    Ok(())
}

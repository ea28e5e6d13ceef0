//! Built-in rule set used when no rule file is configured.

use simwatch_core::config::MeasurementNaming;
use simwatch_core::AlertLevel;
use tracing::warn;

use crate::schema::{Comparator, RuleSpec, ThresholdRule};

struct Patterns {
    serving_sinr: &'static str,
    pdcp_delay: &'static str,
    active_ues: &'static str,
    rrc_latency: &'static str,
}

const CANONICAL: Patterns = Patterns {
    serving_sinr: "^serv_sinr(_3gpp)?_cell_",
    pdcp_delay: "pdcp_delay_downlink",
    active_ues: "^active_ue_count$",
    rrc_latency: "^rrc_connection_time$",
};

const LEGACY: Patterns = Patterns {
    serving_sinr: ".*Serv_SINR_cell.*",
    pdcp_delay: ".*PdcpSduDelayDl.*",
    active_ues: "numActiveUes_cell.*",
    rrc_latency: "RRC.ConnMean.*",
};

fn specs(p: &Patterns) -> Vec<RuleSpec> {
    vec![
        RuleSpec {
            cooldown_seconds: 60,
            consecutive_violations: 2,
            ..RuleSpec::new(
                "low_sinr_warning",
                p.serving_sinr,
                -5.0,
                Comparator::Lt,
                AlertLevel::Warning,
                "Low SINR: {{ measurement }} = {{ value|round(2) }}dB (threshold: {{ threshold }}dB)",
            )
        },
        RuleSpec {
            cooldown_seconds: 30,
            consecutive_violations: 1,
            ..RuleSpec::new(
                "very_low_sinr_critical",
                p.serving_sinr,
                -10.0,
                Comparator::Lt,
                AlertLevel::Critical,
                "Very low SINR: {{ measurement }} = {{ value|round(2) }}dB",
            )
        },
        RuleSpec {
            cooldown_seconds: 60,
            consecutive_violations: 2,
            ..RuleSpec::new(
                "high_pdcp_delay_warning",
                p.pdcp_delay,
                100.0,
                Comparator::Gt,
                AlertLevel::Warning,
                "High latency: {{ measurement }} = {{ value|round(2) }}ms (threshold: {{ threshold }}ms)",
            )
        },
        RuleSpec {
            cooldown_seconds: 30,
            consecutive_violations: 1,
            ..RuleSpec::new(
                "very_high_pdcp_delay_critical",
                p.pdcp_delay,
                200.0,
                Comparator::Gt,
                AlertLevel::Critical,
                "Very high latency: {{ measurement }} = {{ value|round(2) }}ms",
            )
        },
        RuleSpec {
            cooldown_seconds: 120,
            consecutive_violations: 1,
            ..RuleSpec::new(
                "cell_overload_warning",
                p.active_ues,
                20.0,
                Comparator::Gt,
                AlertLevel::Warning,
                "Cell overload: {{ measurement }} has {{ value|round }} UEs attached (threshold: {{ threshold }})",
            )
        },
        RuleSpec {
            cooldown_seconds: 60,
            consecutive_violations: 2,
            ..RuleSpec::new(
                "rrc_connection_latency",
                p.rrc_latency,
                50.0,
                Comparator::Gt,
                AlertLevel::Warning,
                "RRC connection latency: {{ measurement }} = {{ value|round(2) }}ms (threshold: {{ threshold }}ms)",
            )
        },
    ]
}

/// The six monitoring rules, with patterns matching the measurement names
/// produced under `naming`.
pub fn default_rules(naming: MeasurementNaming) -> Vec<ThresholdRule> {
    let patterns = match naming {
        MeasurementNaming::Canonical => &CANONICAL,
        MeasurementNaming::Legacy => &LEGACY,
    };
    specs(patterns)
        .into_iter()
        .filter_map(|spec| {
            let name = spec.name.clone();
            ThresholdRule::try_from(spec)
                .map_err(|e| warn!(rule = %name, error = %e, "built-in rule rejected"))
                .ok()
        })
        .collect()
}

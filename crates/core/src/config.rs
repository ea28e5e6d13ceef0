use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimwatchError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub influx: InfluxConfig,
    pub watch: WatchConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SIMWATCH_PROFILE`. When set (e.g. `LAB`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SIMWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            influx: InfluxConfig::from_env_profiled(p),
            watch: WatchConfig::from_env_profiled(p),
            monitor: MonitorConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  influx:   url={}, db={}", self.influx.base_url(), self.influx.database);
        tracing::info!("  watch:    dir={}, naming={}", self.watch.trace_dir.display(), self.watch.naming);
        tracing::info!(
            "  monitor:  interval={}s, alert_log={}, rules={}",
            self.monitor.interval_secs,
            self.monitor.alert_log_path.display(),
            self.monitor
                .rules_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string()),
        );
    }
}

// ── InfluxDB ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upper bound for one store round-trip.
    pub timeout_ms: u64,
}

impl InfluxConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "INFLUX_HOST", "localhost"),
            port: profiled_env_u16(p, "INFLUX_PORT", 8086),
            database: profiled_env_or(p, "INFLUX_DB", "influx"),
            username: profiled_env_opt(p, "INFLUX_USER"),
            password: profiled_env_opt(p, "INFLUX_PASS"),
            timeout_ms: profiled_env_u64(p, "INFLUX_TIMEOUT_MS", 5_000),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// ── Trace watching ────────────────────────────────────────────

/// How trace columns are turned into measurement names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementNaming {
    /// Canonical metric names; UE, cell and layer identity live in tags.
    #[default]
    Canonical,
    /// Per-series names with identity baked in (`SINR_cell_3_ue_111_up`).
    Legacy,
}

impl FromStr for MeasurementNaming {
    type Err = SimwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "legacy" => Ok(Self::Legacy),
            other => Err(SimwatchError::Config(format!(
                "unknown measurement naming '{other}' (expected canonical or legacy)"
            ))),
        }
    }
}

impl std::fmt::Display for MeasurementNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canonical => write!(f, "canonical"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub trace_dir: PathBuf,
    pub naming: MeasurementNaming,
}

impl WatchConfig {
    fn from_env_profiled(p: &str) -> Self {
        let trace_dir = profiled_env_opt(p, "SIM_TRACE_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join("nsoran_LLM_mon_ns3")))
            .unwrap_or_else(|| PathBuf::from("."));
        let naming = match profiled_env_opt(p, "SIM_NAMING") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to canonical naming");
                MeasurementNaming::Canonical
            }),
            None => MeasurementNaming::Canonical,
        };
        Self { trace_dir, naming }
    }
}

// ── Threshold monitor ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    pub alert_log_path: PathBuf,
    /// YAML rule file; the built-in rule set is used when unset.
    pub rules_file: Option<PathBuf>,
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            interval_secs: profiled_env_u64(p, "MONITOR_INTERVAL_SECS", 10).max(1),
            alert_log_path: PathBuf::from(profiled_env_or(p, "ALERT_LOG_PATH", "alerts.log")),
            rules_file: profiled_env_opt(p, "RULES_FILE").map(PathBuf::from),
        }
    }
}

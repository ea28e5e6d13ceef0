//! Command-line flags. Every flag overrides the matching env-derived
//! config value when given.

use std::path::PathBuf;

use clap::Parser;

use simwatch_core::config::MeasurementNaming;
use simwatch_core::Config;

/// Watches simulator trace files, stores their metrics and raises
/// threshold alerts.
#[derive(Parser, Debug)]
#[command(name = "simwatch", version, about)]
pub struct Cli {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "SIMWATCH_PROFILE")]
    pub profile: Option<String>,

    /// Directory holding the simulator trace files.
    #[arg(long)]
    pub trace_dir: Option<PathBuf>,

    /// Measurement naming scheme: `canonical` or `legacy`.
    #[arg(long)]
    pub naming: Option<MeasurementNaming>,

    /// Seconds between rule evaluation cycles.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Append-only JSON alert log.
    #[arg(long)]
    pub alert_log: Option<PathBuf>,

    /// YAML rule file (built-in rules when omitted).
    #[arg(long)]
    pub rules_file: Option<PathBuf>,

    /// Keep points in memory instead of writing to InfluxDB.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not watch trace files.
    #[arg(long, conflicts_with = "no_monitor")]
    pub no_watch: bool,

    /// Do not evaluate threshold rules.
    #[arg(long)]
    pub no_monitor: bool,
}

impl Cli {
    /// Resolve the config for the selected profile and apply flag overrides.
    pub fn resolve_config(&self) -> Config {
        let mut config = match &self.profile {
            Some(profile) => Config::for_profile(profile),
            None => Config::from_env(),
        };
        if let Some(dir) = &self.trace_dir {
            config.watch.trace_dir = dir.clone();
        }
        if let Some(naming) = self.naming {
            config.watch.naming = naming;
        }
        if let Some(secs) = self.interval {
            config.monitor.interval_secs = secs.max(1);
        }
        if let Some(path) = &self.alert_log {
            config.monitor.alert_log_path = path.clone();
        }
        if let Some(path) = &self.rules_file {
            config.monitor.rules_file = Some(path.clone());
        }
        config
    }
}

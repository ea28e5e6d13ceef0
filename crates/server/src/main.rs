//! `simwatch`: simulator trace watcher and threshold monitor.
//!
//! Runs two independent loops until Ctrl-C:
//! - the trace watcher, ingesting file changes into the metric store
//! - the rule poller, evaluating thresholds and dispatching alerts

mod app;
mod cli;

use clap::Parser;
use tracing::info;

use simwatch_core::config::load_dotenv;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = cli.resolve_config();
    config.log_summary();

    let store = app::open_store(&config, cli.dry_run).await?;

    let watcher = if cli.no_watch {
        None
    } else {
        Some(app::start_watcher(&config, store.clone())?)
    };

    let poller = if cli.no_monitor {
        None
    } else {
        Some(app::build_poller(&config, store.clone())?)
    };

    match poller {
        Some(poller) => {
            tokio::select! {
                _ = poller.run() => {}
                res = tokio::signal::ctrl_c() => res?,
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    info!("shutting down");
    if let Some(watcher) = watcher {
        watcher.stop();
    }
    Ok(())
}

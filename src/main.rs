//! Daemon entry point: parse arguments, load configuration, run the
//! orchestrator until a termination signal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dbus_systemd_dispatcher::{
    load, BehaviorRegistry, LogWriter, Orchestrator, RuntimeError, SearchPath, Subscribe,
};

/// Dispatches D-Bus signals to systemd unit start/stop transitions.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file name looked up on the search path.
    #[arg(long, default_value = "config.yml")]
    config: String,

    /// Extra directory searched before the XDG locations.
    #[arg(long)]
    search_path: Option<PathBuf>,

    /// Apply only the highest-priority file instead of merging all of them.
    #[arg(long = "override")]
    override_mode: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let search = SearchPath::from_env(cli.search_path);
    let (targets, settings) =
        load(&search, &cli.config, cli.override_mode).context("loading configuration")?;
    if targets.is_empty() {
        anyhow::bail!("configuration defines no targets");
    }
    tracing::info!(targets = targets.len(), "configuration loaded");

    let registry = BehaviorRegistry::with_builtins();
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let orchestrator = Orchestrator::new(settings, subscribers, registry);
    if let Err(err) = orchestrator.run(targets).await {
        if let RuntimeError::Startup(cause) = &err {
            tracing::error!(label = cause.as_label(), "startup failed");
        }
        return Err(err.into());
    }
    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

mod commands;
mod event_layer;
mod render;
mod repl;

use event_layer::{AutoSaveEvent, AutoSaveEventLayer};
use scriptflow_application::ScriptViewer;
use scriptflow_core::config::RootConfig;
use scriptflow_infrastructure::{ConfigService, ScriptflowPaths};

#[derive(Parser)]
#[command(name = "scriptflow")]
#[command(about = "Scriptflow - guided call scripts for contact-center agents", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/scriptflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Script document for physical persons (path or http(s) URL)
    #[arg(long, global = true)]
    physical: Option<String>,

    /// Script document for legal entities (path or http(s) URL)
    #[arg(long, global = true)]
    legal_entity: Option<String>,

    /// Root directory of the document store
    #[arg(long, global = true)]
    store_root: Option<PathBuf>,

    /// Run without the document store; edits stay in memory
    #[arg(long, global = true)]
    no_store: bool,

    /// Auto-save quiet window in milliseconds
    #[arg(long, global = true)]
    debounce_ms: Option<u64>,

    /// Log filter for stderr output (e.g. "debug", "scriptflow_application=trace")
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Repl,
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    fn apply_overrides(&self, config: &mut RootConfig) {
        if let Some(physical) = &self.physical {
            config.sources.physical = physical.clone();
        }
        if let Some(legal_entity) = &self.legal_entity {
            config.sources.legal_entity = legal_entity.clone();
        }
        if let Some(root) = &self.store_root {
            config.store.root = Some(root.clone());
        }
        if self.no_store {
            config.store.enabled = false;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.autosave.debounce_ms = debounce_ms;
        }
    }
}

fn init_tracing(filter: &str, events: mpsc::UnboundedSender<AutoSaveEvent>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .with_context(|| format!("invalid log filter '{}'", filter))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter),
        )
        .with(AutoSaveEventLayer::new(events))
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    init_tracing(&cli.log, event_tx)?;

    let paths = ScriptflowPaths::default();
    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::from_paths(&paths),
    };
    let mut config = config_service.get_config();
    cli.apply_overrides(&mut config);

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Repl => {
            let viewer = Arc::new(
                ScriptViewer::from_config(&config, &paths).context("failed to set up the viewer")?,
            );
            repl::run(viewer, event_rx).await?;
        }
    }

    Ok(())
}

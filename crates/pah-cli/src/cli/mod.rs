//! CLI entry and dispatch.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use pah_core::config::{HubConfig, paths};
use pah_core::draft::DraftStore;

#[derive(Parser)]
#[command(name = "pah")]
#[command(version = "0.1")]
#[command(about = "Terminal client for the Personal Agentic Hub")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the hub base URL from config
    #[arg(long, value_name = "URL")]
    hub_url: Option<String>,

    /// Verbose logging to the log file
    #[arg(long)]
    debug: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the interactive chat (the default)
    Chat,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HubConfig::load()?;
    if let Some(hub_url) = cli.hub_url {
        config.hub_url = hub_url;
    }

    match cli.command {
        None | Some(Commands::Chat) => run_chat(&config, cli.debug),
        Some(Commands::Config { command }) => run_config(&config, &command),
    }
}

fn run_chat(config: &HubConfig, debug: bool) -> Result<()> {
    // Keep the appender guard alive for the whole session; dropping
    // it loses buffered log lines.
    let _guard = init_logging(debug)?;

    let drafts = DraftStore::new(paths::state_path()?);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(pah_tui::run_interactive_chat(config, drafts))
}

fn run_config(config: &HubConfig, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            println!("{}", paths::config_path()?.display());
        }
        ConfigCommands::Show => {
            let rendered =
                toml::to_string_pretty(config).context("failed to render configuration")?;
            print!("{rendered}");
        }
    }
    Ok(())
}

/// File logging only; stdout belongs to the TUI.
fn init_logging(debug: bool) -> Result<WorkerGuard> {
    let log_dir = paths::log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, "pah.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_filter = if debug {
        "pah=debug,pah_core=debug,pah_tui=debug"
    } else {
        "pah=info,pah_core=info,pah_tui=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .init();

    Ok(guard)
}

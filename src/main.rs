//! parley - message and compose-box translation for web chat clients
//!
//! Main entry point for the parley CLI.

mod cli;
mod cmd_store;
mod replay;
mod stores;

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use parley_config::{Config, ConfigLoader, ConfigValidator};

use cli::{Cli, Commands};
use cmd_store::{handle_cache_command, handle_contacts_command, handle_history_command, handle_translate};
use replay::handle_replay;
use stores::parley_dir;

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.parley/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = parley_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("parley")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the program lifetime.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Console logs go to stderr; stdout carries command output.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load and validate the configuration, falling back to defaults when the
/// file does not exist.
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(&cli.config)?;
    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    info!("Configuration loaded from {:?}", cli.config);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Translate { text, input } => handle_translate(&config, &text, input).await,
        Commands::Cache { action } => handle_cache_command(&config, action).await,
        Commands::History { action } => handle_history_command(&config, action).await,
        Commands::Contacts { action } => handle_contacts_command(&config, action).await,
        Commands::Replay {
            fixture,
            offline,
            render,
        } => handle_replay(&config, &fixture, offline, render).await,
    }
}

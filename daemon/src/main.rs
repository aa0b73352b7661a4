mod channel;
mod config;
mod error;
mod mode;
mod monitor;
mod paths;
mod ping;
mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::channel::SerialChannel;
use crate::config::Settings;
use crate::monitor::ModeMonitor;
use crate::snapshot::SystemSnapshot;

/// Drives a USB light controller from whichever tracked game is running.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serial port name, overriding the config file.
    #[arg(long, global = true)]
    port: Option<String>,

    /// Log every poll in detail.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch processes and push mode changes to the controller (default).
    Run,
    /// Echo timestamps through the controller to check the serial wiring.
    Ping,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            // Logging is not up yet; the level depends on the config.
            eprintln!("Goodbye. {e:#}");
            std::process::exit(1);
        }
    };
    init_logging(settings.verbose);

    // ── Ctrl+C ────────────────────────────────────────────────────────────────
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C; the daemon can only be killed now");
                // Hold on to the sender so the loops do not see a closed channel.
                std::future::pending::<()>().await;
            }
        }
    });

    let outcome = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(&settings, stop_rx).await,
        Command::Ping => ping::run(&settings.serial, ping::ECHO_INTERVAL, stop_rx)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from),
    };

    let (message, code) = farewell(&outcome);
    if code == 0 {
        info!("{message}");
    } else {
        error!("{message}");
        std::process::exit(code);
    }
}

/// Maps how the daemon ended to its farewell message and exit status.
/// `Ok` only ever means the operator asked to stop.
fn farewell(outcome: &Result<()>) -> (String, i32) {
    match outcome {
        Ok(()) => ("Goodbye. (interrupted)".to_string(), 0),
        Err(e) => (format!("Goodbye. {e:#}"), 1),
    }
}

async fn run_daemon(settings: &Settings, stop: watch::Receiver<bool>) -> Result<()> {
    info!(
        "gamelight-daemon v{} initializing serial on {}...",
        env!("CARGO_PKG_VERSION"),
        settings.serial.port
    );
    let channel = SerialChannel::open(&settings.serial)?;
    info!("Success.");

    if settings.table.is_empty() {
        warn!("No processes configured; the light will stay in idle mode");
    }

    let mut monitor = ModeMonitor::start(
        settings.table.clone(),
        settings.idle_mode.clone(),
        SystemSnapshot::new(),
        channel,
    )?;
    monitor.run(settings.poll_interval, stop).await?;
    Ok(())
}

/// Reads the config file once and applies command-line overrides.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = match &cli.config {
        Some(p) => p.clone(),
        None => paths::config_file_path()?,
    };
    let mut config = config::load_or_default(&path)?;

    if let Some(port) = &cli.port {
        config.serial.port = port.clone();
    }
    if cli.verbose {
        config.verbose = true;
    }

    config
        .into_settings()
        .with_context(|| format!("Invalid config: {}", path.display()))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "gamelight_daemon=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

//! Macropad Bridge - Entry Point
//!
//! Reports the frontmost application to the MacroPad and handles commands
//! sent back from it. Runs until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use macropad_bridge::{
    core::{config::Config, shutdown::Shutdown},
    host::{MicMuteAction, SystemAppName, SystemAudioInput},
    session::{CommandRouter, SerialConnector, ShutdownClock, Supervisor},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "macropad-bridge",
    about = "Send the frontmost app name to the MacroPad and relay its commands"
)]
struct Cli {
    /// Serial device path (auto-detected if omitted)
    port: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    info!("Configuration loaded");

    let shutdown = Shutdown::new();
    let router = CommandRouter::new(MicMuteAction::new(Box::new(SystemAudioInput)));
    let mut supervisor = Supervisor::new(
        SerialConnector::new(cli.port, config.serial.clone()),
        ShutdownClock::new(shutdown.clone()),
        router,
        Box::new(SystemAppName),
        config.timing.clone(),
    );

    // The serial loop is blocking; keep it off the async workers.
    let mut worker = tokio::task::spawn_blocking(move || supervisor.run());

    tokio::select! {
        result = &mut worker => {
            // Only returns early if the worker panicked
            return result.context("Supervisor task failed");
        }
        _ = wait_for_signal() => {
            info!("Interrupt received, shutting down");
            shutdown.trigger();
        }
    }

    worker.await.context("Supervisor task failed")?;
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

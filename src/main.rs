//! Code Battle Royale - typing-driven battle royale in the terminal
//!
//! This is the main entry point. It handles:
//! - Configuration and tracing setup
//! - Loading the stored high score
//! - Reading keystrokes from stdin
//! - Running the match loop until quit, EOF or a shutdown signal

mod app;
mod config;
mod driver;
mod game;
mod snippets;
mod store;
mod util;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::driver::{read_stdin, LogPresenter, MatchRunner, TracingAudio};

/// Buffered keystrokes between the stdin reader and the match loop
const COMMAND_CHANNEL_SIZE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!("Starting Code Battle Royale");
    info!(
        remote_snippets = config.remote_snippets,
        score_dir = %config.score_dir.display(),
        "Configuration loaded"
    );

    // Create application state
    let state = AppState::new(config);
    info!(seed = state.seed, "Match seed");

    // Spawn stdin reader
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    tokio::spawn(read_stdin(command_tx));

    let runner = MatchRunner::new(
        state.new_controller(),
        state.supplier.clone(),
        state.store.clone(),
        TracingAudio,
        LogPresenter::default(),
        state.config.tick_rate,
        state.config.frame_rate,
    );

    let snapshot = runner.run(command_rx, shutdown_signal()).await;

    match snapshot.stats {
        Some(stats) => info!(
            rank = stats.rank,
            total = stats.total_players,
            wpm = stats.wpm,
            accuracy = stats.accuracy,
            "Final result"
        ),
        None => info!(wpm = snapshot.wpm, "Left before the match ended"),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}

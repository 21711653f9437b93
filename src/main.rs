//! Worm Arena - headless match runner
//!
//! Reads commands from stdin (one per line, see `app::console`) and prints
//! match snapshots to stdout as JSON lines. Logs go to stderr.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worm_arena::app::{parse_command, MatchRunner};
use worm_arena::config::Config;
use worm_arena::game::snapshot::MatchSnapshot;
use worm_arena::game::{Command, Match, MatchConfig};

/// Queued commands between the stdin reader and the tick loop
const COMMAND_BUFFER: usize = 64;
/// Snapshots a slow stdout may fall behind before skipping
const SNAPSHOT_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!("Starting Worm Arena");

    let game = Match::new(MatchConfig {
        seed: config.match_seed,
        ..MatchConfig::default()
    })?;
    info!(
        match_id = %game.id(),
        seed = game.seed(),
        tick_rate = config.tick_rate,
        snapshot_rate = config.snapshot_rate,
        "Match ready (set MATCH_SEED={} to replay)",
        game.seed()
    );

    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = broadcast::channel(SNAPSHOT_BUFFER);

    tokio::spawn(read_commands(command_tx));
    let printer = tokio::spawn(print_snapshots(snapshot_rx));

    let runner = MatchRunner::new(game, &config, command_rx, snapshot_tx);
    tokio::select! {
        game = runner.run() => {
            info!(winner = ?game.winner(), ticks = game.tick(), "Run finished");
        }
        _ = shutdown_signal() => {}
    }

    // The runner owned the snapshot sender; the printer drains and exits
    printer.await?;

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging on stderr so stdout carries only snapshots
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Forward parsed stdin lines to the match until EOF
async fn read_commands(command_tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                if command_tx.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(line = %line.trim(), error = %e, "Rejected command"),
        }
    }
    info!("Input closed");
}

/// Print every published snapshot as one JSON line
async fn print_snapshots(mut snapshot_rx: broadcast::Receiver<MatchSnapshot>) {
    loop {
        match snapshot_rx.recv().await {
            Ok(snapshot) => match serde_json::to_string(&snapshot) {
                Ok(json) => println!("{json}"),
                Err(e) => error!(error = %e, "Failed to encode snapshot"),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_count = n, "Output lagged, skipping {} snapshots", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install signal handler");
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

//! Expiring Cache - interactive shell
//!
//! Reads commands from stdin, one per line, and runs them against a single
//! in-process cache. Type `HELP` for the command list.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expiring_cache::command::{Command, Reply};
use expiring_cache::{Config, ExpiringCache};

/// Main entry point for the interactive cache shell.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache, which starts its background sweeper
/// 4. Run commands from stdin until EOF, `QUIT` or a shutdown signal
/// 5. Dispose the cache, cancelling the sweeper
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so replies on stdout stay clean.
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expiring_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        sweep_interval = ?config.sweep_interval,
        default_timeout = ?config.default_timeout,
        "Configuration loaded"
    );

    let cache: ExpiringCache<String, String> = ExpiringCache::from_config(&config);

    tokio::select! {
        result = run_shell(&cache) => result?,
        _ = shutdown_signal() => {}
    }

    cache.dispose();
    info!("Shutdown complete");
    Ok(())
}

/// Runs commands until EOF or `QUIT`.
async fn run_shell(cache: &ExpiringCache<String, String>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match Command::parse(&line) {
            Ok(command) => command.execute(cache),
            Err(e) => Reply::Error(e.to_string()),
        };

        stdout
            .write_all(format!("{reply}\n").as_bytes())
            .await
            .context("Failed to write reply")?;
        stdout.flush().await.context("Failed to flush stdout")?;

        if reply == Reply::Bye {
            break;
        }
    }

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

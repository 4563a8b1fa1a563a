//! Ultimate Fighter - local match host
//!
//! Runs one authoritative match and bridges it to a front end over
//! stdin/stdout JSON lines. Logs go to stderr.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ultimate_fighter::config::Config;
use ultimate_fighter::game::{GameMatch, PlayerSlot};
use ultimate_fighter::host::{run_stdio, Keymap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    let seed = config.seed.unwrap_or_else(rand::random);
    let match_id = Uuid::new_v4();

    info!("Starting Ultimate Fighter");
    info!(
        %match_id,
        seed,
        tick_rate = config.tick_rate,
        stage_width = config.stage.width,
        "Match configured"
    );

    let keymap = Keymap::default();
    for slot in [PlayerSlot::One, PlayerSlot::Two] {
        let keys: Vec<String> = keymap
            .keys_for(slot)
            .into_iter()
            .map(|(action, key)| format!("{action:?}={key}"))
            .collect();
        info!(player = slot.label(), keys = %keys.join(" "), "Key bindings");
    }

    let (game_match, handle) = GameMatch::new(match_id, seed, &config);
    let runner = tokio::spawn(game_match.run());

    let session = tokio::select! {
        result = run_stdio(handle, keymap) => Some(result),
        _ = shutdown_signal() => None,
    };

    // Either way the session's handle is gone by now, which stops the runner
    runner.await?;
    info!("Shutdown complete");

    match session {
        Some(result) => result,
        // A pending stdin read would otherwise hold the runtime open
        None => std::process::exit(0),
    }
}

/// Initialize tracing/logging on stderr; stdout carries the protocol
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

/// Graceful shutdown signal handler
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

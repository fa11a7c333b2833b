// Draft relay entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config
// 3. Open database
// 4. Create the change feed
// 5. Bind and run the relay until Ctrl+C

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use sideline_draft::config;
use sideline_draft::db::Database;
use sideline_draft::relay;
use sideline_draft::sync::ChangeFeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("draft relay starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: league={}, relay port {}",
        config.league_name, config.relay_port
    );

    let db = Arc::new(Database::open(&config.db_path).context("failed to open database")?);
    info!("database opened at {}", config.db_path);

    let feed = ChangeFeed::new(config.channel_capacity);

    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.relay_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.relay_port))?;

    let relay_handle = tokio::spawn(async move {
        if let Err(e) = relay::run(listener, db, feed).await {
            error!("relay error: {e}");
        }
    });

    info!("relay ready on 127.0.0.1:{}", config.relay_port);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    // The accept loop runs forever; stop it directly.
    relay_handle.abort();

    info!("draft relay shut down cleanly");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sideline_draft=info,warn")),
        )
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

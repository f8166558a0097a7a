use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mss_bot::config::{BotConfig, ConfigSource};
use mss_bot::db::pool::{create_pool, run_migrations};
use mss_bot::engine::dispatcher::Dispatcher;
use mss_bot::engine::session::SessionStore;
use mss_bot::engine::status::StatusService;
use mss_bot::engine::store::SqliteConfigStore;
use mss_bot::minecraft::ping::SlpPinger;
use mss_bot::minecraft::probe::StatusProbe;
use mss_bot::telegram::client::TelegramClient;

#[derive(Parser)]
#[command(version, about = "Telegram bot reporting Minecraft server status")]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "bot.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, source) = BotConfig::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();
    if source == ConfigSource::Defaults {
        info!(path = %args.config.display(), "no config file found, using defaults");
    }
    info!("starting with {config}");

    config.ensure_database_dir()?;
    let pool = create_pool(&config.database.url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let store = Arc::new(SqliteConfigStore::new(pool.clone()));
    let probe = StatusProbe::new(Arc::new(SlpPinger::default()), config.ping_timeout());
    let service = Arc::new(StatusService::new(store, probe));

    let client = TelegramClient::new(
        &config.telegram.api_url,
        &config.telegram.token,
        config.poll_timeout(),
    )
    .context("failed to build telegram client")?;
    let me = client
        .get_me()
        .await
        .context("telegram rejected the bot token")?;
    info!(
        bot_id = me.id,
        username = me.username.as_deref().unwrap_or("<none>"),
        "authorized on telegram"
    );

    let dispatcher = Dispatcher::new(Arc::new(client), service, Arc::new(SessionStore::new()));

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    dispatcher.run(cancel).await;

    pool.close().await;
    info!("shutdown complete");
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
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
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
    token.cancel();
}

use anyhow::Context;
use penwatch::api::{self, app_state::AppState};
use penwatch::clients::{ContentSource, DiscordNotifier, LogNotifier, Notifier, RedditClient};
use penwatch::config::ConfigLoader;
use penwatch::observability::{ComponentHealth, ObservabilityState, init_tracing};
use penwatch::services::{MatchEngine, PenCatalog, Poller};
use penwatch::storage::SeenPostStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // credentials may live in .env
    let _ = dotenv::dotenv();

    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging);
    ConfigLoader::validate(&config).context("invalid configuration")?;
    info!("Starting penwatch v{}...", env!("CARGO_PKG_VERSION"));

    let (catalog, report) = PenCatalog::open(&config.storage, &config.resolver, &config.catalog)?;
    if !report.pens.skipped.is_empty() || !report.monitoring.dropped.is_empty() {
        warn!(
            "Catalog loaded with {} corrupt alias lines and {} unknown monitored names",
            report.pens.skipped.len(),
            report.monitoring.dropped.len()
        );
    }
    let catalog = Arc::new(catalog);
    info!(
        "Catalog ready: {} pens, monitoring [{}]",
        catalog.pen_count(),
        catalog.monitored().join(", ")
    );

    let seen = Arc::new(SeenPostStore::open(&config.storage.seen_posts_db)?);
    let observability = Arc::new(ObservabilityState::new(env!("CARGO_PKG_VERSION").to_string()));
    observability.report(ComponentHealth::healthy(
        "seen_store",
        format!("{} ids", seen.len()?),
    ));

    let source: Arc<dyn ContentSource> = Arc::new(RedditClient::new(config.reddit.clone())?);
    let notifier: Arc<dyn Notifier> = if DiscordNotifier::is_configured(&config.discord) {
        Arc::new(DiscordNotifier::new(config.discord.clone())?)
    } else {
        warn!("Discord is not configured, matches will only be logged");
        Arc::new(LogNotifier)
    };

    let poller = Arc::new(Poller::new(
        catalog.clone(),
        MatchEngine::new(seen.clone()),
        source,
        notifier,
        observability.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let polling = if config.polling.enabled {
        let interval = Duration::from_secs(config.polling.interval_secs);
        Some(tokio::spawn(poller.clone().run(interval, shutdown_rx)))
    } else {
        info!("Background polling disabled; use POST /api/v1/poll");
        None
    };

    let router = api::create_router(AppState::new(catalog, seen, poller, observability));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = polling {
        let _ = handle.await;
    }
    info!("penwatch stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

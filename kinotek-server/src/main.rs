use std::sync::Arc;

use anyhow::Context;
use kinotek_config::ApiSettings;
use kinotek_core::{ElasticSearch, RedisCache};
use kinotek_server::{AppState, create_app};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kinotek_server=debug,kinotek_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ApiSettings::from_env().context("failed to load API settings")?;
    info!("Server configuration loaded");

    // Both backend clients are established before traffic is accepted and
    // shared by every in-flight request.
    let cache = RedisCache::connect(&settings.redis_url)
        .await
        .context("failed to connect to Redis")?;
    let search = ElasticSearch::new(&settings.es_url);

    let state = AppState::new(Arc::new(cache), Arc::new(search));
    let app = create_app(state);

    let addr = format!("{}:{}", settings.server_host, settings.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received interrupt, draining connections");
    }
}

//! kinotek ETL: incrementally mirrors the relational film source into the
//! search index.
//!
//! A single cooperative worker polls the source tables for rows past each
//! stream's durable watermark, denormalizes the affected films, and
//! bulk-loads the documents. Delivery is at-least-once and idempotent by
//! document id; watermarks advance only after a confirmed load.

mod backoff;
mod loader;
mod pipeline;
mod producer;
mod state;

use std::sync::Arc;

use anyhow::Context;
use kinotek_config::EtlSettings;
use kinotek_core::ElasticSearch;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backoff::{RetryPolicy, retry};
use crate::loader::Loader;
use crate::pipeline::Pipeline;
use crate::producer::Producer;
use crate::state::JsonFileState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinotek_etl=info,kinotek_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = EtlSettings::from_env().context("failed to load ETL settings")?;
    info!("ETL settings loaded, state file at {:?}", settings.state_path);

    let state = JsonFileState::open(&settings.state_path).context("failed to open state file")?;
    let producer = Producer::connect(&settings.postgres.connection_string())
        .context("failed to set up the source connection pool")?;
    let search = Arc::new(ElasticSearch::new(&settings.es_url));
    let loader = Loader::new(search);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, draining");
            let _ = shutdown_tx.send(true);
        }
    });

    match retry(
        &RetryPolicy::default(),
        "index bootstrap",
        shutdown_rx.clone(),
        || loader.ensure_indices(),
    )
    .await
    {
        Ok(()) => {}
        Err(kinotek_core::CatalogError::Cancelled(_)) => return Ok(()),
        Err(e) => return Err(e).context("failed to create indices"),
    }

    let mut pipeline = Pipeline::new(producer, loader, state, shutdown_rx);
    pipeline.run().await.context("pipeline failed")?;

    info!("Pipeline stopped");
    Ok(())
}

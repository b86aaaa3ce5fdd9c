//! Round-robin orchestration of the change streams.
//!
//! Each tick runs every stream once: fetch past the stream's watermark,
//! bulk-load the batch, then commit the watermark. A tick that moves no
//! documents is followed by an idle sleep. Shutdown is checked between
//! streams and between ticks; an in-flight query is left to finish.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kinotek_core::services::film::MOVIES_INDEX;
use kinotek_core::services::genre::GENRES_INDEX;
use kinotek_core::{CatalogError, Result};
use kinotek_model::Film;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backoff::{RetryPolicy, retry};
use crate::loader::Loader;
use crate::producer::{Producer, SourceTable};
use crate::state::JsonFileState;

/// How long an idle tick sleeps before polling the source again.
const IDLE_INTERVAL: Duration = Duration::from_secs(1);

pub struct Pipeline {
    producer: Producer,
    loader: Loader,
    state: JsonFileState,
    policy: RetryPolicy,
    shutdown: watch::Receiver<bool>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        producer: Producer,
        loader: Loader,
        state: JsonFileState,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            producer,
            loader,
            state,
            policy: RetryPolicy::default(),
            shutdown,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            if self.shutting_down() {
                info!("Shutdown requested, stopping pipeline");
                return Ok(());
            }

            let moved = match self.tick().await {
                Ok(moved) => moved,
                Err(CatalogError::Cancelled(what)) => {
                    info!("Shutdown requested while retrying {}", what);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            if moved == 0 {
                debug!("Idle tick, sleeping {:?}", IDLE_INTERVAL);
                let mut shutdown = self.shutdown.clone();
                tokio::select! {
                    _ = tokio::time::sleep(IDLE_INTERVAL) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }
    }

    async fn tick(&mut self) -> Result<usize> {
        let mut moved = 0;

        moved += self.films_by_self_stream().await?;
        if self.shutting_down() {
            return Ok(moved);
        }

        moved += self.genre_stream().await?;
        if self.shutting_down() {
            return Ok(moved);
        }

        moved += self.films_by_persons_stream().await?;

        if moved > 0 {
            info!("Tick moved {} documents", moved);
        }
        Ok(moved)
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn films_by_self_stream(&mut self) -> Result<usize> {
        let since = self.watermark(SourceTable::FilmWork)?;
        let batch = retry(
            &self.policy,
            "films-by-self fetch",
            self.shutdown.clone(),
            || self.producer.films_by_modified_self(since),
        )
        .await?;

        let Some(watermark) = batch.watermark else {
            return Ok(0);
        };

        let docs = film_docs(&batch.films)?;
        let count = retry(
            &self.policy,
            "movies bulk load",
            self.shutdown.clone(),
            || self.loader.bulk_load(MOVIES_INDEX, &docs),
        )
        .await?;

        self.commit(SourceTable::FilmWork, watermark)?;
        Ok(count)
    }

    /// The genre watermark covers two outputs (film fan-outs and genre
    /// documents), so it commits only after both loads succeed.
    async fn genre_stream(&mut self) -> Result<usize> {
        let since = self.watermark(SourceTable::Genre)?;
        let batch = retry(
            &self.policy,
            "genre stream fetch",
            self.shutdown.clone(),
            || self.producer.by_modified_genres(since),
        )
        .await?;

        let Some(watermark) = batch.watermark else {
            return Ok(0);
        };

        let movie_docs = film_docs(&batch.films)?;
        let mut count = retry(
            &self.policy,
            "movies bulk load",
            self.shutdown.clone(),
            || self.loader.bulk_load(MOVIES_INDEX, &movie_docs),
        )
        .await?;

        let genre_docs = batch
            .genres
            .iter()
            .map(|(id, genre)| Ok((*id, serde_json::to_value(genre)?)))
            .collect::<Result<Vec<(Uuid, Value)>>>()?;
        count += retry(
            &self.policy,
            "genres bulk load",
            self.shutdown.clone(),
            || self.loader.bulk_load(GENRES_INDEX, &genre_docs),
        )
        .await?;

        self.commit(SourceTable::Genre, watermark)?;
        Ok(count)
    }

    async fn films_by_persons_stream(&mut self) -> Result<usize> {
        let since = self.watermark(SourceTable::Person)?;
        let batch = retry(
            &self.policy,
            "films-by-persons fetch",
            self.shutdown.clone(),
            || self.producer.films_by_modified_persons(since),
        )
        .await?;

        let Some(watermark) = batch.watermark else {
            return Ok(0);
        };

        let docs = film_docs(&batch.films)?;
        let count = retry(
            &self.policy,
            "movies bulk load",
            self.shutdown.clone(),
            || self.loader.bulk_load(MOVIES_INDEX, &docs),
        )
        .await?;

        self.commit(SourceTable::Person, watermark)?;
        Ok(count)
    }

    fn watermark(&self, table: SourceTable) -> Result<DateTime<Utc>> {
        let Some(raw) = self.state.get(table.state_key()) else {
            return Ok(DateTime::UNIX_EPOCH);
        };

        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                CatalogError::Internal(format!(
                    "corrupt watermark for {}: {raw:?}: {e}",
                    table.name()
                ))
            })
    }

    fn commit(&mut self, table: SourceTable, watermark: DateTime<Utc>) -> Result<()> {
        info!("{}: watermark advanced to {}", table.name(), watermark);
        self.state.set(table.state_key(), watermark.to_rfc3339())
    }
}

fn film_docs(films: &HashMap<Uuid, Film>) -> Result<Vec<(Uuid, Value)>> {
    films
        .iter()
        .map(|(id, film)| Ok((*id, serde_json::to_value(film)?)))
        .collect()
}

//! Watermark-driven change detection against the relational source.
//!
//! Three streams resolve modified rows down to affected film documents
//! (directly, through genre membership, or through crew membership); the
//! genre stream additionally mirrors the changed genres as standalone
//! documents. Each stream returns the batch together with the watermark it
//! earned; committing that watermark is the orchestrator's job and happens
//! only after the batch is loaded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kinotek_core::{CatalogError, Result};
use kinotek_model::{Film, Genre, Person, Role};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Source tables that carry a `modified` watermark column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTable {
    FilmWork,
    Person,
    Genre,
}

impl SourceTable {
    pub fn name(&self) -> &'static str {
        match self {
            SourceTable::FilmWork => "film_work",
            SourceTable::Person => "person",
            SourceTable::Genre => "genre",
        }
    }

    /// Key under which this table's watermark lives in the state file.
    pub fn state_key(&self) -> &'static str {
        match self {
            SourceTable::FilmWork => "film_work_proceed_date_time",
            SourceTable::Person => "person_proceed_date_time",
            SourceTable::Genre => "genre_proceed_date_time",
        }
    }
}

/// A batch of denormalized film documents plus the watermark to commit once
/// they are loaded. `watermark` is `None` when the stream was idle.
#[derive(Debug)]
pub struct FilmBatch {
    pub films: HashMap<Uuid, Film>,
    pub watermark: Option<DateTime<Utc>>,
}

/// Output of the genre-driven stream. One modified-genre batch fans out to
/// the affected film documents and doubles as the source of standalone
/// genre documents; both ride the single `genre` watermark, which may only
/// be committed after both loads.
#[derive(Debug)]
pub struct GenreStreamBatch {
    pub films: HashMap<Uuid, Film>,
    pub genres: HashMap<Uuid, Genre>,
    pub watermark: Option<DateTime<Utc>>,
}

pub struct Producer {
    pool: PgPool,
    batch_limit: i64,
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("batch_limit", &self.batch_limit)
            .finish_non_exhaustive()
    }
}

/// Batch limit per stream iteration.
pub const BATCH_LIMIT: i64 = 100;

impl Producer {
    pub fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_lazy(database_url)?;

        Ok(Self {
            pool,
            batch_limit: BATCH_LIMIT,
        })
    }

    /// Films whose own row changed.
    pub async fn films_by_modified_self(&self, since: DateTime<Utc>) -> Result<FilmBatch> {
        let batch = self.modified_rows(SourceTable::FilmWork, since).await?;
        self.hydrate_films(batch).await
    }

    /// Everything a changed genre touches: the genre document itself plus
    /// every film reachable through `genre_film_work`.
    pub async fn by_modified_genres(&self, since: DateTime<Utc>) -> Result<GenreStreamBatch> {
        let batch = self.modified_rows(SourceTable::Genre, since).await?;
        let genres = self.genres_by_ids(&batch.ids).await?;
        let film_ids = self
            .fan_out(
                "SELECT DISTINCT fw.id
                 FROM content.film_work fw
                 JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
                 WHERE gfw.genre_id = ANY($1)",
                &batch.ids,
            )
            .await?;
        let films = self
            .hydrate_films(ModifiedBatch {
                ids: film_ids,
                watermark: batch.watermark,
            })
            .await?;

        Ok(GenreStreamBatch {
            films: films.films,
            genres,
            watermark: batch.watermark,
        })
    }

    /// Films affected by a changed person, resolved through
    /// `person_film_work`.
    pub async fn films_by_modified_persons(&self, since: DateTime<Utc>) -> Result<FilmBatch> {
        let batch = self.modified_rows(SourceTable::Person, since).await?;
        let film_ids = self
            .fan_out(
                "SELECT DISTINCT fw.id
                 FROM content.film_work fw
                 JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
                 WHERE pfw.person_id = ANY($1)",
                &batch.ids,
            )
            .await?;
        self.hydrate_films(ModifiedBatch {
            ids: film_ids,
            watermark: batch.watermark,
        })
        .await
    }

    async fn genres_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Genre>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT g.id, g.name, g.description
             FROM content.genre g
             WHERE g.id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres = HashMap::new();
        for row in rows {
            let genre = Genre {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
            };
            genres.insert(genre.id, genre);
        }

        Ok(genres)
    }

    /// Selects up to `batch_limit` rows past the watermark, oldest first
    /// with id as the tie-break, and derives the watermark the batch earns.
    async fn modified_rows(
        &self,
        table: SourceTable,
        since: DateTime<Utc>,
    ) -> Result<ModifiedBatch> {
        let sql = format!(
            "SELECT id, modified FROM content.{} WHERE modified > $1 ORDER BY modified, id LIMIT $2",
            table.name()
        );
        let rows = sqlx::query(&sql)
            .bind(since)
            .bind(self.batch_limit)
            .fetch_all(&self.pool)
            .await?;

        let mut stamped = Vec::with_capacity(rows.len());
        for row in rows {
            stamped.push(StampedId {
                id: row.try_get("id")?,
                modified: row.try_get("modified")?,
            });
        }

        match plan_batch(stamped, self.batch_limit as usize) {
            BatchPlan::Empty => Ok(ModifiedBatch {
                ids: Vec::new(),
                watermark: None,
            }),
            BatchPlan::Take { ids, watermark } => {
                debug!(
                    "{}: {} modified rows up to {}",
                    table.name(),
                    ids.len(),
                    watermark
                );
                Ok(ModifiedBatch {
                    ids,
                    watermark: Some(watermark),
                })
            }
            // The whole batch shares one timestamp; take the entire cluster
            // so the watermark never splits it.
            BatchPlan::Cluster(ts) => {
                let sql = format!(
                    "SELECT id FROM content.{} WHERE modified = $1 ORDER BY id",
                    table.name()
                );
                let rows = sqlx::query(&sql).bind(ts).fetch_all(&self.pool).await?;
                let ids = rows
                    .into_iter()
                    .map(|row| row.try_get("id"))
                    .collect::<std::result::Result<Vec<Uuid>, _>>()?;

                info!(
                    "{}: timestamp cluster of {} rows at {}",
                    table.name(),
                    ids.len(),
                    ts
                );
                Ok(ModifiedBatch {
                    ids,
                    watermark: Some(ts),
                })
            }
        }
    }

    async fn fan_out(&self, sql: &str, source_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(sql)
            .bind(source_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row.try_get("id").map_err(CatalogError::from))
            .collect()
    }

    /// Pulls every contributing row for the given films in one joined query
    /// and merges them into denormalized documents.
    async fn hydrate_films(&self, batch: ModifiedBatch) -> Result<FilmBatch> {
        // No affected films still advances the watermark: the modified rows
        // were observed, there is just nothing to emit for them.
        if batch.ids.is_empty() {
            return Ok(FilmBatch {
                films: HashMap::new(),
                watermark: batch.watermark,
            });
        }

        let rows = sqlx::query(
            "SELECT
                fw.id AS fw_id,
                fw.title AS fw_title,
                fw.description AS fw_description,
                fw.rating AS fw_rating,
                pfw.role AS pfw_role,
                p.id AS p_id,
                p.full_name AS p_full_name,
                g.id AS g_id,
                g.name AS g_name
             FROM content.film_work fw
             LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
             LEFT JOIN content.person p ON p.id = pfw.person_id
             LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
             LEFT JOIN content.genre g ON g.id = gfw.genre_id
             WHERE fw.id = ANY($1)",
        )
        .bind(&batch.ids)
        .fetch_all(&self.pool)
        .await?;

        let mut film_rows = Vec::with_capacity(rows.len());
        for row in rows {
            film_rows.push(FilmRow {
                fw_id: row.try_get("fw_id")?,
                fw_title: row.try_get("fw_title")?,
                fw_description: row.try_get("fw_description")?,
                fw_rating: row.try_get("fw_rating")?,
                pfw_role: row.try_get("pfw_role")?,
                p_id: row.try_get("p_id")?,
                p_full_name: row.try_get("p_full_name")?,
                g_id: row.try_get("g_id")?,
                g_name: row.try_get("g_name")?,
            });
        }

        Ok(FilmBatch {
            films: merge_rows(film_rows),
            watermark: batch.watermark,
        })
    }
}

#[derive(Debug)]
struct ModifiedBatch {
    ids: Vec<Uuid>,
    watermark: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct StampedId {
    id: Uuid,
    modified: DateTime<Utc>,
}

#[derive(Debug)]
enum BatchPlan {
    Empty,
    Take {
        ids: Vec<Uuid>,
        watermark: DateTime<Utc>,
    },
    Cluster(DateTime<Utc>),
}

/// Decides how far a batch may advance the watermark.
///
/// A full batch that ends inside a run of identical timestamps is trimmed
/// back to the last fully observed timestamp, because rows sharing the
/// trailing timestamp may exist beyond the limit and a strict `>` rescan
/// would skip them. When the entire batch is one such run the caller must
/// fetch the whole cluster instead.
fn plan_batch(rows: Vec<StampedId>, limit: usize) -> BatchPlan {
    let Some(last) = rows.last().copied() else {
        return BatchPlan::Empty;
    };

    if rows.len() < limit {
        return BatchPlan::Take {
            ids: rows.into_iter().map(|r| r.id).collect(),
            watermark: last.modified,
        };
    }

    let cluster_start = rows.partition_point(|r| r.modified < last.modified);
    if cluster_start == 0 {
        return BatchPlan::Cluster(last.modified);
    }

    let kept = &rows[..cluster_start];
    BatchPlan::Take {
        ids: kept.iter().map(|r| r.id).collect(),
        watermark: kept[kept.len() - 1].modified,
    }
}

/// One row of the hydration join. A film appears once per
/// (person-role, genre) combination; merging collapses the duplication.
#[derive(Debug, Clone)]
pub(crate) struct FilmRow {
    pub fw_id: Uuid,
    pub fw_title: Option<String>,
    pub fw_description: Option<String>,
    pub fw_rating: Option<f64>,
    pub pfw_role: Option<String>,
    pub p_id: Option<Uuid>,
    pub p_full_name: Option<String>,
    pub g_id: Option<Uuid>,
    pub g_name: Option<String>,
}

/// Folds join rows into one document per film. Unknown roles are dropped
/// silently; rows missing mandatory film columns are logged and skipped.
pub(crate) fn merge_rows(rows: Vec<FilmRow>) -> HashMap<Uuid, Film> {
    let mut films: HashMap<Uuid, Film> = HashMap::new();

    for row in rows {
        let Some(title) = row.fw_title else {
            warn!("Skipping malformed film row {}: NULL title", row.fw_id);
            continue;
        };

        let film = films
            .entry(row.fw_id)
            .or_insert_with(|| Film::new(row.fw_id, title, row.fw_description, row.fw_rating));

        if let (Some(g_id), Some(g_name)) = (row.g_id, row.g_name) {
            film.add_genre(Genre::new(g_id, g_name));
        }

        let (Some(p_id), Some(p_full_name)) = (row.p_id, row.p_full_name) else {
            continue;
        };
        if let Some(role) = row.pfw_role.as_deref().and_then(Role::from_source) {
            film.add_crew(role, Person::new(p_id, p_full_name));
        }
    }

    films
}

//! The polling synchronization loop
//!
//! One pass per tick. Each index is pulled forward in chunks: extract rows
//! past the cursor, transform them, bulk-load them, advance the cursor to
//! the last row's `(updated_at, id)` position. A failed chunk leaves the
//! cursor where it was, so the next pass retries the same rows.

use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use cinema_search_core::{CatalogEntity, Genre, Movie, Person};

use crate::extract;
use crate::load::ElasticLoader;
use crate::state::{Checkpoint, SyncState};
use crate::transform;
use crate::{EtlConfig, Result};

const INDICES: [&str; 3] = [Movie::INDEX, Genre::INDEX, Person::INDEX];

/// Pulls one index forward until `fetch` comes back empty.
///
/// `fetch` returns each row tagged with its cursor position; the state is
/// advanced to the last row of a chunk only after `load` accepted the whole
/// chunk. The tag must carry the row's id as well as its timestamp so a
/// chunk boundary inside a group of identically stamped rows does not lose
/// the rest of the group.
async fn sync_chunks<T, FetchFut, LoadFut>(
    state: &mut SyncState,
    index: &str,
    chunk_size: i64,
    mut fetch: impl FnMut(Checkpoint, i64) -> FetchFut,
    mut load: impl FnMut(Vec<T>) -> LoadFut,
) -> Result<()>
where
    FetchFut: Future<Output = Result<Vec<(Checkpoint, T)>>>,
    LoadFut: Future<Output = Result<()>>,
{
    loop {
        let cursor = state.checkpoint(index).unwrap_or_default();
        let rows = fetch(cursor, chunk_size).await?;
        let Some(last) = rows.last().map(|(position, _)| *position) else {
            return Ok(());
        };

        let documents: Vec<T> = rows.into_iter().map(|(_, document)| document).collect();
        let count = documents.len();
        load(documents).await?;
        state.advance(index, last)?;
        info!(index, count, "Synchronized chunk");
    }
}

pub struct SyncPipeline {
    pool: PgPool,
    loader: ElasticLoader,
    state: SyncState,
    chunk_size: i64,
    poll_interval: Duration,
}

impl SyncPipeline {
    pub fn new(pool: PgPool, loader: ElasticLoader, config: &EtlConfig) -> Self {
        Self {
            pool,
            loader,
            state: SyncState::load(&config.sync.state_file),
            chunk_size: config.sync.chunk_size,
            poll_interval: Duration::from_secs(config.sync.poll_interval_sec),
        }
    }

    /// Runs forever, one synchronization pass per poll interval.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_pass().await {
                error!(error = %err, "Synchronization pass failed, will retry next tick");
            }
        }
    }

    /// One full pass over every index.
    pub async fn run_pass(&mut self) -> Result<()> {
        for index in INDICES {
            self.loader.ensure_index(index).await?;
        }
        self.sync_movies().await?;
        self.sync_genres().await?;
        self.sync_persons().await?;
        Ok(())
    }

    async fn sync_movies(&mut self) -> Result<()> {
        let pool = &self.pool;
        let loader = &self.loader;
        sync_chunks(
            &mut self.state,
            Movie::INDEX,
            self.chunk_size,
            |cursor, limit| async move {
                let rows = extract::fetch_movies(pool, cursor, limit).await?;
                let documents: Vec<(Checkpoint, (Uuid, Movie))> = rows
                    .into_iter()
                    .map(|row| {
                        let position = Checkpoint::new(row.updated_at, row.id);
                        transform::movie_from_row(row)
                            .map(|movie| (position, (movie.id, movie)))
                    })
                    .collect::<Result<_>>()?;
                Ok(documents)
            },
            |documents| async move { loader.load(&documents).await },
        )
        .await
    }

    async fn sync_genres(&mut self) -> Result<()> {
        let pool = &self.pool;
        let loader = &self.loader;
        sync_chunks(
            &mut self.state,
            Genre::INDEX,
            self.chunk_size,
            |cursor, limit| async move {
                let rows = extract::fetch_genres(pool, cursor, limit).await?;
                let documents: Vec<(Checkpoint, (Uuid, Genre))> = rows
                    .into_iter()
                    .map(|row| {
                        let position = Checkpoint::new(row.updated_at, row.id);
                        let genre = transform::genre_from_row(row);
                        (position, (genre.id, genre))
                    })
                    .collect();
                Ok(documents)
            },
            |documents| async move { loader.load(&documents).await },
        )
        .await
    }

    async fn sync_persons(&mut self) -> Result<()> {
        let pool = &self.pool;
        let loader = &self.loader;
        sync_chunks(
            &mut self.state,
            Person::INDEX,
            self.chunk_size,
            |cursor, limit| async move {
                let rows = extract::fetch_persons(pool, cursor, limit).await?;
                let documents: Vec<(Checkpoint, (Uuid, Person))> = rows
                    .into_iter()
                    .map(|row| {
                        let position = Checkpoint::new(row.updated_at, row.id);
                        transform::person_from_row(row)
                            .map(|person| (position, (person.id, person)))
                    })
                    .collect::<Result<_>>()?;
                Ok(documents)
            },
            |documents| async move { loader.load(&documents).await },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EtlError;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for the keyset query: rows past the cursor in
    /// `(updated_at, id)` order, at most `limit` of them.
    fn page(rows: &[(Checkpoint, Uuid)], cursor: Checkpoint, limit: i64) -> Vec<(Checkpoint, Uuid)> {
        rows.iter()
            .filter(|(position, _)| *position > cursor)
            .take(limit as usize)
            .copied()
            .collect()
    }

    fn state_in(dir: &tempfile::TempDir) -> SyncState {
        SyncState::load(dir.path().join("sync_state.json"))
    }

    #[tokio::test]
    async fn rows_sharing_a_timestamp_survive_a_chunk_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        // Three rows stamped by one transaction, chunked two at a time: the
        // third must arrive in the second chunk, not vanish.
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let rows: Vec<(Checkpoint, Uuid)> = ids
            .iter()
            .map(|id| (Checkpoint::new(ts, *id), *id))
            .collect();

        let loaded = Arc::new(Mutex::new(Vec::new()));
        let sink = loaded.clone();

        sync_chunks(
            &mut state,
            "movies",
            2,
            |cursor, limit| {
                let rows = rows.clone();
                async move { Ok(page(&rows, cursor, limit)) }
            },
            |chunk: Vec<Uuid>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().extend(chunk);
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(*loaded.lock().unwrap(), ids);
        assert_eq!(
            state.checkpoint("movies"),
            Some(Checkpoint::new(ts, ids[2]))
        );
    }

    #[tokio::test]
    async fn failed_chunk_leaves_the_cursor_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let rows = vec![(Checkpoint::new(ts, Uuid::new_v4()), Uuid::new_v4())];

        let result = sync_chunks(
            &mut state,
            "movies",
            2,
            |cursor, limit| {
                let rows = rows.clone();
                async move { Ok(page(&rows, cursor, limit)) }
            },
            |_chunk: Vec<Uuid>| async move {
                Err(EtlError::BulkRejected("index is read only".to_string()))
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(state.checkpoint("movies"), None);
    }

    #[tokio::test]
    async fn empty_fetch_ends_the_pass_without_touching_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);

        sync_chunks(
            &mut state,
            "movies",
            2,
            |_cursor, _limit| async move { Ok(Vec::new()) },
            |_chunk: Vec<Uuid>| async move { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(state.checkpoint("movies"), None);
    }
}

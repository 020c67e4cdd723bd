//! Checkpoint state for incremental extraction
//!
//! One JSON file holds a per-index cursor. It is read before each pass and
//! rewritten after every loaded chunk, so a crashed pass resumes from the
//! last chunk that made it into the search index rather than from scratch.
//!
//! The cursor is the `(updated_at, id)` pair of the last loaded row, not the
//! timestamp alone. Postgres stamps every row of a transaction with the same
//! `updated_at`, so a timestamp-only cursor would skip the rows that share
//! the boundary timestamp with the end of a chunk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use crate::Result;

/// Position of the last loaded row in `(updated_at, id)` order.
///
/// The derived ordering is lexicographic over the fields, matching the SQL
/// row comparison `(updated_at, id) > ($1, $2)` the extractor pages with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Checkpoint {
    pub updated_at: DateTime<Utc>,
    pub last_id: Uuid,
}

impl Checkpoint {
    pub fn new(updated_at: DateTime<Utc>, last_id: Uuid) -> Self {
        Self {
            updated_at,
            last_id,
        }
    }
}

impl Default for Checkpoint {
    /// Cursor before any row: every real `(updated_at, id)` pair sorts after
    /// it.
    fn default() -> Self {
        Self {
            updated_at: DateTime::<Utc>::MIN_UTC,
            last_id: Uuid::nil(),
        }
    }
}

/// Per-index synchronization cursors backed by a JSON file.
pub struct SyncState {
    path: PathBuf,
    entries: HashMap<String, Checkpoint>,
}

impl SyncState {
    /// Load cursors from `path`. A missing or unreadable file starts the
    /// pipeline from scratch, which is safe: documents are fully replaced on
    /// load.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Unreadable state file, starting fresh");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cursor for an index, if any pass has completed a chunk.
    pub fn checkpoint(&self, index: &str) -> Option<Checkpoint> {
        self.entries.get(index).copied()
    }

    /// Record a new cursor and persist the whole state file.
    pub fn advance(&mut self, index: &str, checkpoint: Checkpoint) -> Result<()> {
        self.entries.insert(index.to_string(), checkpoint);
        let raw = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

//! Seen-post store
//!
//! Durable set of post ids that have already been notified, backed by an
//! embedded SQLite database. Only presence is meaningful; the first-seen
//! timestamp is kept for inspection.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::{AppError, Result};

/// One row of the seen-post store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeenPost {
    pub post_id: String,
    pub seen_at: DateTime<Utc>,
}

/// Durable key-presence store keyed by post id
pub struct SeenPostStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SeenPostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenPostStore")
            .field("path", &self.path)
            .finish()
    }
}

/// The membership checks the match engine needs from a seen-post store
pub trait SeenLog: Send + Sync + std::fmt::Debug {
    fn has_seen(&self, post_id: &str) -> Result<bool>;

    /// Returns `true` when `post_id` was not recorded before
    fn mark_seen(&self, post_id: &str) -> Result<bool>;
}

impl SeenLog for SeenPostStore {
    fn has_seen(&self, post_id: &str) -> Result<bool> {
        SeenPostStore::has_seen(self, post_id)
    }

    fn mark_seen(&self, post_id: &str) -> Result<bool> {
        SeenPostStore::mark_seen(self, post_id)
    }
}

impl SeenPostStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        let store = Self::init(conn, Some(path))?;
        tracing::info!("Seen-post store opened: {:?} ({} ids)", store.path, store.len()?);
        Ok(store)
    }

    /// Non-durable store, for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS seen_posts (
                post_id TEXT PRIMARY KEY,
                seen_at TEXT NOT NULL
            );
            "#,
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_seen(&self, post_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let hit = conn
            .query_row(
                "SELECT 1 FROM seen_posts WHERE post_id = ?1",
                params![post_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Record `post_id` as seen.
    ///
    /// The insert is committed before this returns. Returns `true` when the
    /// id was not present before.
    pub fn mark_seen(&self, post_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO seen_posts (post_id, seen_at) VALUES (?1, ?2)",
                params![post_id, Utc::now().to_rfc3339()],
            )
            .map_err(|e| AppError::write_failed("seen-post store", e))?;
        Ok(inserted > 0)
    }

    pub fn len(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM seen_posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every seen id, oldest first
    pub fn list(&self) -> Result<Vec<SeenPost>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT post_id, seen_at FROM seen_posts ORDER BY seen_at, post_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut posts = Vec::new();
        for row in rows {
            let (post_id, seen_at) = row?;
            let seen_at = DateTime::parse_from_rfc3339(&seen_at)
                .map_err(|e| AppError::Database(format!("bad timestamp for {post_id}: {e}")))?
                .with_timezone(&Utc);
            posts.push(SeenPost { post_id, seen_at });
        }
        Ok(posts)
    }

    /// Operator-triggered reset; returns how many ids were forgotten
    pub fn reset(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM seen_posts", [])
            .map_err(|e| AppError::write_failed("seen-post store", e))?;
        tracing::warn!("Seen-post store reset, {} ids forgotten", removed);
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_query() {
        let store = SeenPostStore::open_in_memory().unwrap();
        assert!(!store.has_seen("abc").unwrap());

        assert!(store.mark_seen("abc").unwrap());
        assert!(store.has_seen("abc").unwrap());
        assert!(!store.has_seen("abd").unwrap());
    }

    #[test]
    fn test_mark_is_idempotent() {
        let store = SeenPostStore::open_in_memory().unwrap();
        assert!(store.mark_seen("abc").unwrap());
        assert!(!store.mark_seen("abc").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("seen_posts.db");

        {
            let store = SeenPostStore::open(&path).unwrap();
            store.mark_seen("1a").unwrap();
            store.mark_seen("1b").unwrap();
        }

        let store = SeenPostStore::open(&path).unwrap();
        assert!(store.has_seen("1a").unwrap());
        assert!(store.has_seen("1b").unwrap());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_list_and_reset() {
        let store = SeenPostStore::open_in_memory().unwrap();
        store.mark_seen("x1").unwrap();
        store.mark_seen("x2").unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|p| p.post_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"x1".to_string()));

        assert_eq!(store.reset().unwrap(), 2);
        assert!(store.is_empty().unwrap());
        assert!(!store.has_seen("x1").unwrap());
    }
}

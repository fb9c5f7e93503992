//! Known-episode lookups
//!
//! The season-pack heuristic compares the number of episodes named by a
//! release with the number of episodes the local library knows for that
//! season. This module provides the lookup seam and two backends.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OpenFlags};

use crate::error::{Result, TntError};

/// Counts the episodes known for a show's season.
pub trait EpisodeCounter: Send + Sync {
    fn count_episodes(&self, show_id: u64, season: u32) -> Result<usize>;
}

impl<T: EpisodeCounter + ?Sized> EpisodeCounter for Box<T> {
    fn count_episodes(&self, show_id: u64, season: u32) -> Result<usize> {
        (**self).count_episodes(show_id, season)
    }
}

/// In-memory episode counts keyed by show and season.
#[derive(Debug, Clone, Default)]
pub struct EpisodeIndex {
    counts: HashMap<(u64, u32), usize>,
}

impl EpisodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how many episodes a season has
    pub fn with_season(mut self, show_id: u64, season: u32, episodes: usize) -> Self {
        self.counts.insert((show_id, season), episodes);
        self
    }
}

impl EpisodeCounter for EpisodeIndex {
    fn count_episodes(&self, show_id: u64, season: u32) -> Result<usize> {
        Ok(self.counts.get(&(show_id, season)).copied().unwrap_or(0))
    }
}

const COUNT_EPISODES_SQL: &str =
    "SELECT COUNT(*) AS count FROM tv_episodes WHERE showid = ?1 AND season = ?2";

/// Episode counts read from a library database with a `tv_episodes` table.
///
/// The connection is opened read-only; the scraper never writes to the
/// library.
pub struct SqliteEpisodeIndex {
    conn: Mutex<Connection>,
}

impl SqliteEpisodeIndex {
    /// Open an existing library database.
    ///
    /// # Errors
    /// Returns `TntError::Database` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already opened connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl EpisodeCounter for SqliteEpisodeIndex {
    fn count_episodes(&self, show_id: u64, season: u32) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| TntError::Database(rusqlite::Error::InvalidQuery))?;

        let count: i64 = conn.query_row(
            COUNT_EPISODES_SQL,
            params![show_id as i64, season],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE tv_episodes (showid INTEGER, season INTEGER, episode INTEGER);
             INSERT INTO tv_episodes VALUES (10, 1, 1), (10, 1, 2), (10, 1, 3), (10, 2, 1);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_episode_index_counts() {
        let index = EpisodeIndex::new().with_season(1, 1, 6).with_season(1, 2, 10);
        assert_eq!(index.count_episodes(1, 1).unwrap(), 6);
        assert_eq!(index.count_episodes(1, 2).unwrap(), 10);
        assert_eq!(index.count_episodes(1, 3).unwrap(), 0);
        assert_eq!(index.count_episodes(2, 1).unwrap(), 0);
    }

    #[test]
    fn test_sqlite_index_counts() {
        let index = SqliteEpisodeIndex::from_connection(library());
        assert_eq!(index.count_episodes(10, 1).unwrap(), 3);
        assert_eq!(index.count_episodes(10, 2).unwrap(), 1);
        assert_eq!(index.count_episodes(11, 1).unwrap(), 0);
    }

    #[test]
    fn test_sqlite_index_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let index = SqliteEpisodeIndex::from_connection(conn);
        let result = index.count_episodes(10, 1);
        assert!(matches!(result, Err(TntError::Database(_))));
    }

    #[test]
    fn test_sqlite_open_missing_file() {
        let result = SqliteEpisodeIndex::open(Path::new("/nonexistent/library.db"));
        assert!(result.is_err());
    }
}

//! SQLite-backed conversation log.
//!
//! One row per turn. Rows are append-only: never updated, only bulk-deleted
//! by session. Retrieval of the most recent N turns orders by
//! `timestamp DESC, id DESC` and then reverses, so ties on coarse timestamps
//! break by insertion order and the replayed history is deterministic.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use tokio::sync::Mutex;
use tracing::{debug, info};

use bliss_core::Turn;

pub struct ConversationLog {
    conn: Mutex<Connection>,
}

impl ConversationLog {
    /// Create or open a database at the given path. Schema and index are
    /// created lazily if absent, along with the parent directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open conversation database {}", path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS conversations (
                 id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                 user_input         TEXT NOT NULL,
                 assistant_response TEXT NOT NULL,
                 timestamp          DATETIME DEFAULT CURRENT_TIMESTAMP,
                 session_id         TEXT DEFAULT 'default'
             );
             CREATE INDEX IF NOT EXISTS idx_timestamp ON conversations (timestamp);",
        )
        .context("failed to initialize conversations schema")?;

        info!("conversation log opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                 id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                 user_input         TEXT NOT NULL,
                 assistant_response TEXT NOT NULL,
                 timestamp          DATETIME DEFAULT CURRENT_TIMESTAMP,
                 session_id         TEXT DEFAULT 'default'
             );
             CREATE INDEX IF NOT EXISTS idx_timestamp ON conversations (timestamp);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert one turn. Always creates a new row; no validation on the text.
    pub async fn append(&self, user_text: &str, assistant_text: &str, session: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO conversations (user_input, assistant_response, session_id)
             VALUES (?1, ?2, ?3)",
            params![user_text, assistant_text, session],
        )
        .context("failed to append turn")?;
        debug!(session, "turn appended");
        Ok(())
    }

    /// The most recent `limit` turns for a session, in chronological order.
    pub async fn recent(&self, session: &str, limit: usize) -> Result<Vec<Turn>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT user_input, assistant_response, timestamp, session_id
             FROM conversations
             WHERE session_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;

        let mut turns: Vec<Turn> = stmt
            .query_map(params![session, limit as i64], |row| {
                Ok(Turn {
                    user_text: row.get(0)?,
                    assistant_text: row.get(1)?,
                    timestamp: row.get::<_, NaiveDateTime>(2)?,
                    session_id: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()
            .context("failed to read recent turns")?;

        turns.reverse();
        Ok(turns)
    }

    /// Total turns stored for a session.
    pub async fn count(&self, session: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let count = conn
            .query_row(
                "SELECT COUNT(*) FROM conversations WHERE session_id = ?1",
                params![session],
                |row| row.get(0),
            )
            .context("failed to count turns")?;
        Ok(count)
    }

    /// Delete all turns for a session. Irreversible. Returns the number of
    /// rows removed.
    pub async fn clear(&self, session: &str) -> Result<usize> {
        let conn = self.conn.lock().await;
        let removed = conn
            .execute(
                "DELETE FROM conversations WHERE session_id = ?1",
                params![session],
            )
            .context("failed to clear session")?;
        info!(session, removed, "session cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_then_recent_roundtrip() {
        let log = ConversationLog::in_memory().expect("in-memory db");
        log.append("hi", "hello!", "s1").await.unwrap();

        let turns = log.recent("s1", 1).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_text, "hi");
        assert_eq!(turns[0].assistant_text, "hello!");
        assert_eq!(turns[0].session_id, "s1");
    }

    #[tokio::test]
    async fn test_recent_bounded_and_chronological() {
        let log = ConversationLog::in_memory().unwrap();
        for i in 0..7 {
            log.append(&format!("u{i}"), &format!("a{i}"), "s1")
                .await
                .unwrap();
        }

        let turns = log.recent("s1", 5).await.unwrap();
        assert_eq!(turns.len(), 5);
        // Last 5 by time, replayed oldest to newest. All rows typically share
        // one CURRENT_TIMESTAMP second here, so this also pins the row-id
        // tie-break.
        let inputs: Vec<&str> = turns.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(inputs, vec!["u2", "u3", "u4", "u5", "u6"]);
    }

    #[tokio::test]
    async fn test_recent_ignores_other_sessions() {
        let log = ConversationLog::in_memory().unwrap();
        log.append("mine", "ok", "s1").await.unwrap();
        log.append("other", "ok", "s2").await.unwrap();

        let turns = log.recent("s1", 10).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_text, "mine");
    }

    #[tokio::test]
    async fn test_clear_isolates_sessions() {
        let log = ConversationLog::in_memory().unwrap();
        log.append("a", "b", "s1").await.unwrap();
        log.append("c", "d", "s1").await.unwrap();
        log.append("e", "f", "s2").await.unwrap();

        let removed = log.clear("s1").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(log.count("s1").await.unwrap(), 0);
        assert_eq!(log.count("s2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_empty_session() {
        let log = ConversationLog::in_memory().unwrap();
        assert_eq!(log.count("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_is_accepted() {
        let log = ConversationLog::in_memory().unwrap();
        log.append("", "", "s1").await.unwrap();
        assert_eq!(log.count("s1").await.unwrap(), 1);
    }
}

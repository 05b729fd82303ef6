//! SQLite connection pool and schema setup for save games.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use crate::PersistenceError;

/// Schema statements, applied in order. Weapons come before players so the
/// foreign key target exists. Every statement is `IF NOT EXISTS`.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS save_states (
        id          INTEGER PRIMARY KEY,
        slot        INTEGER NOT NULL UNIQUE,
        playtime    INTEGER NOT NULL DEFAULT 0,
        location    TEXT    NOT NULL,
        last_saved  TEXT    NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weapons (
        id    INTEGER PRIMARY KEY,
        name  TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS players (
        id             INTEGER PRIMARY KEY,
        name           TEXT    NOT NULL,
        health         INTEGER NOT NULL DEFAULT 100,
        weapon_id      INTEGER REFERENCES weapons (id),
        save_state_id  INTEGER NOT NULL REFERENCES save_states (id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_players_save_state ON players (save_state_id)",
];

/// Holds a connection pool to the save database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `path`, apply the schema, and return
    /// a ready-to-use `Database`.
    pub async fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::debug!("Opened save database at {}", path.display());

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Create an in-memory database for testing. The schema is applied.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // A second connection would see a different, empty in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Create the save tables if they are missing.
    ///
    /// Safe to call on every startup: existing tables and rows are left
    /// untouched. All statements run in one transaction so a failure leaves
    /// no half-built schema behind.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(PersistenceError::Schema)?;
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&mut *tx)
                .await
                .map_err(PersistenceError::Schema)?;
        }
        tx.commit().await.map_err(PersistenceError::Schema)?;

        tracing::info!("Save schema ready");
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

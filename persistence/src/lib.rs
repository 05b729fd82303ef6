//! Persistence for the beat 'em up: transactional save slots in SQLite and a
//! JSON-file leaderboard of completion times.
//!
//! The two halves are independent. [`saves`] replaces a slot's location,
//! players and weapons atomically; [`leaderboard`] keeps the fastest times
//! and ranks them even when older files stored them in other shapes.

pub mod config;
mod error;
pub mod leaderboard;
pub mod saves;

pub use error::PersistenceError;
pub use leaderboard::{LeaderboardStore, RetentionPolicy};
pub use saves::{Database, SaveRepository, SqliteSaveRepository};

use std::path::Path;

/// Open the save database configured for `data_dir`.
pub async fn open_save_repository(
    data_dir: &Path,
) -> Result<(Database, SqliteSaveRepository), PersistenceError> {
    let db = Database::open(&config::get_save_db_path(data_dir)).await?;
    let repo = SqliteSaveRepository::new(db.pool().clone());
    Ok((db, repo))
}

/// Build the leaderboard configured for `data_dir`. Nothing is read until
/// first use.
pub fn open_leaderboard(data_dir: &Path, retention: RetentionPolicy) -> LeaderboardStore {
    LeaderboardStore::new(
        data_dir,
        &config::get_leaderboard_database(),
        &config::get_leaderboard_collection(),
        retention,
    )
}

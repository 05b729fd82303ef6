//! Configuration for the persistence layer.
//!
//! Every value has a compile-time default and can be overridden at runtime via
//! a dedicated environment variable. Data directory precedence:
//! 1. BEATEMUP_DATA_DIR environment variable
//! 2. ~/.local/share/beatemup (production default)
//! 3. ./data (fallback for development)

use crate::leaderboard::RetentionPolicy;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = ".local/share/beatemup";
const DEV_DATA_DIR: &str = "./data";

/// File name of the SQLite save database inside the data directory.
const DEFAULT_SAVE_DB_FILE: &str = "GameDatabase.db";

/// Folder holding leaderboard collections inside the data directory.
const DEFAULT_LEADERBOARD_DATABASE: &str = "ScoreDatabase";

/// Leaderboard collection (file stem) for best completion times.
const DEFAULT_LEADERBOARD_COLLECTION: &str = "best_times";

/// Get the data directory for persistence.
///
/// Priority:
/// 1. `BEATEMUP_DATA_DIR` env variable if set
/// 2. `$HOME/.local/share/beatemup` if HOME is set
/// 3. `./data` as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BEATEMUP_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_DATA_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the path of the save-game database inside `data_dir`.
///
/// The file name can be overridden with `BEATEMUP_SAVE_DB`.
pub fn get_save_db_path(data_dir: &Path) -> PathBuf {
    let file = std::env::var("BEATEMUP_SAVE_DB").unwrap_or_else(|_| DEFAULT_SAVE_DB_FILE.into());
    data_dir.join(file)
}

/// Get the leaderboard database (folder) name.
///
/// Priority:
/// 1. `BEATEMUP_LEADERBOARD_DB` env variable if set
/// 2. `ScoreDatabase` as fallback
pub fn get_leaderboard_database() -> String {
    std::env::var("BEATEMUP_LEADERBOARD_DB")
        .unwrap_or_else(|_| DEFAULT_LEADERBOARD_DATABASE.to_string())
}

/// Get the leaderboard collection name.
///
/// Priority:
/// 1. `BEATEMUP_LEADERBOARD_COLLECTION` env variable if set
/// 2. `best_times` as fallback
pub fn get_leaderboard_collection() -> String {
    std::env::var("BEATEMUP_LEADERBOARD_COLLECTION")
        .unwrap_or_else(|_| DEFAULT_LEADERBOARD_COLLECTION.to_string())
}

/// Get the leaderboard retention policy.
///
/// Priority:
/// 1. `BEATEMUP_LEADERBOARD_RETENTION` env variable if set (falls back to the
///    default if the value is not `keep-all` or `best-only`)
/// 2. [`RetentionPolicy::KeepAll`] as fallback
pub fn get_retention_policy() -> RetentionPolicy {
    retention_from(std::env::var("BEATEMUP_LEADERBOARD_RETENTION").ok().as_deref())
}

fn retention_from(value: Option<&str>) -> RetentionPolicy {
    match value.map(str::parse::<RetentionPolicy>) {
        Some(Ok(policy)) => policy,
        Some(Err(e)) => {
            tracing::warn!("Ignoring BEATEMUP_LEADERBOARD_RETENTION: {}", e);
            RetentionPolicy::default()
        }
        None => RetentionPolicy::default(),
    }
}

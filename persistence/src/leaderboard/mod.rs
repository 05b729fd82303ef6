//! Document-backed leaderboard of best completion times.
//!
//! Scores live in a single JSON array file, loaded into memory on first use
//! and rewritten in full after every change. Earlier builds of the game
//! wrote the value as an integer score or a string; [`ScoreValue`] reads all
//! of those shapes and [`ScoreValue::tolerant_cmp`] ranks them together.

mod json_collection;
mod score;
mod store;

pub use json_collection::JsonCollection;
pub use score::{compare_entries, ScoreEntry, ScoreValue, TIMESTAMP_FORMAT};
pub use store::{DeleteOutcome, InsertOutcome, LeaderboardStore, RetentionPolicy};

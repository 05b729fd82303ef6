//! Relational save-game storage.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: allows one writer and multiple concurrent readers.
//! - **Foreign keys enabled**: a player can only reference an existing slot
//!   and weapon. Deletes never cascade; the repository removes players first.
//! - **Idempotent schema**: [`Database::ensure_schema`] runs on every
//!   [`Database::open`] and only creates what is missing.
//!
//! ## Tables
//!
//! | Table | Holds |
//! |-------|-------|
//! | `save_states` | one row per occupied slot number |
//! | `players` | the players of a slot, with an optional weapon |
//! | `weapons` | the deduplicated weapon catalog |
//!
//! ## Saving
//!
//! [`SqliteSaveRepository`] replaces a slot in a single transaction: old
//! players and slot row are deleted, the new slot row and players inserted,
//! and weapon names resolved through [`weapon_catalog`] on the same
//! transaction. Any failure rolls the whole thing back.

mod database;
mod slot_repo;
mod traits;
mod types;
pub mod weapon_catalog;

pub use database::Database;
pub use slot_repo::SqliteSaveRepository;
pub use traits::SaveRepository;
pub use types::{PlayerSnapshot, SavedSlot, SlotSnapshot, SlotSummary, WeaponRecord, NO_WEAPON};

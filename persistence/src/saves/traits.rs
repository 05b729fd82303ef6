//! Async repository trait for save slots.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and can be driven from `tokio::spawn`.

use super::types::{SavedSlot, SlotSnapshot, SlotSummary, WeaponRecord};
use crate::PersistenceError;
use std::future::Future;

/// Repository for save slots together with their players and weapons.
///
/// Implementations must write a slot atomically: after `save_slot` returns,
/// either the whole snapshot is committed or the slot is exactly as it was.
pub trait SaveRepository: Send + Sync {
    /// Replace the contents of `slot` with `snapshot`.
    fn save_slot(
        &self,
        slot: u32,
        snapshot: &SlotSnapshot,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Load a committed slot. `None` if the slot was never saved.
    fn load_slot(
        &self,
        slot: u32,
    ) -> impl Future<Output = Result<Option<SavedSlot>, PersistenceError>> + Send;
    fn list_slots(&self) -> impl Future<Output = Result<Vec<SlotSummary>, PersistenceError>> + Send;
    /// Remove a slot and its players. Returns `false` if there was nothing to remove.
    fn delete_slot(&self, slot: u32) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn list_weapons(
        &self,
    ) -> impl Future<Output = Result<Vec<WeaponRecord>, PersistenceError>> + Send;
}

//! SQLite-backed repository for save slots.

use sqlx::{Sqlite, SqlitePool, Transaction};

use super::traits::SaveRepository;
use super::types::{PlayerSnapshot, SavedSlot, SlotSnapshot, SlotSummary, WeaponRecord};
use super::weapon_catalog;
use crate::PersistenceError;

/// Row type for slot queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct SlotRow {
    id: i64,
    slot: i64,
    playtime: i64,
    location: String,
    last_saved: String,
}

/// Row type for the players/weapons join, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct PlayerRow {
    name: String,
    health: i64,
    weapon_name: Option<String>,
}

impl From<PlayerRow> for PlayerSnapshot {
    fn from(r: PlayerRow) -> Self {
        Self {
            name: r.name,
            health: u32::try_from(r.health).unwrap_or(0),
            weapon: r.weapon_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    slot: i64,
    location: String,
    playtime: i64,
    last_saved: String,
    player_count: i64,
}

impl From<SummaryRow> for SlotSummary {
    fn from(r: SummaryRow) -> Self {
        Self {
            slot: r.slot as u32,
            location: r.location,
            playtime_secs: r.playtime as u32,
            last_saved: r.last_saved,
            player_count: r.player_count as u32,
        }
    }
}

/// SQLite implementation of [`SaveRepository`].
pub struct SqliteSaveRepository {
    pool: SqlitePool,
}

impl SqliteSaveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Reject input that can never be saved, before touching the database.
fn validate(slot: u32, snapshot: &SlotSnapshot) -> Result<(), PersistenceError> {
    if slot == 0 {
        return Err(PersistenceError::validation("save slot numbers start at 1"));
    }
    for (i, player) in snapshot.players.iter().enumerate() {
        if player.name.trim().is_empty() {
            return Err(PersistenceError::validation(format!(
                "player {} has an empty name",
                i + 1
            )));
        }
        if player.weapon.as_deref().is_some_and(|w| w.trim().is_empty()) {
            return Err(PersistenceError::validation(format!(
                "player '{}' has an empty weapon name",
                player.name
            )));
        }
    }
    Ok(())
}

/// Delete the slot's players, then the slot row itself.
async fn remove_slot(tx: &mut Transaction<'_, Sqlite>, slot: i64) -> Result<u64, sqlx::Error> {
    sqlx::query(
        "DELETE FROM players WHERE save_state_id IN (SELECT id FROM save_states WHERE slot = ?)",
    )
    .bind(slot)
    .execute(&mut **tx)
    .await?;

    let removed = sqlx::query("DELETE FROM save_states WHERE slot = ?")
        .bind(slot)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    Ok(removed)
}

/// Every write of a save, in order. Nothing here commits.
async fn write_slot(
    tx: &mut Transaction<'_, Sqlite>,
    slot: i64,
    snapshot: &SlotSnapshot,
) -> Result<(), sqlx::Error> {
    remove_slot(tx, slot).await?;

    let save_state_id = sqlx::query(
        r#"
        INSERT INTO save_states (slot, playtime, location, last_saved)
        VALUES (?, ?, ?, datetime('now'))
        "#,
    )
    .bind(slot)
    .bind(snapshot.playtime_secs as i64)
    .bind(&snapshot.location)
    .execute(&mut **tx)
    .await?
    .last_insert_rowid();

    for player in &snapshot.players {
        let weapon_id = match player.weapon.as_deref() {
            Some(name) => Some(weapon_catalog::resolve_or_create(tx, name).await?),
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO players (name, health, weapon_id, save_state_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&player.name)
        .bind(player.health as i64)
        .bind(weapon_id)
        .bind(save_state_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

impl SaveRepository for SqliteSaveRepository {
    async fn save_slot(&self, slot: u32, snapshot: &SlotSnapshot) -> Result<(), PersistenceError> {
        validate(slot, snapshot)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PersistenceError::Transaction { slot, source })?;

        if let Err(source) = write_slot(&mut tx, slot as i64, snapshot).await {
            tracing::error!(slot, "Error saving game, rolling back: {}", source);
            if let Err(e) = tx.rollback().await {
                // Dropping the transaction still rolls it back.
                tracing::warn!(slot, "Explicit rollback failed: {}", e);
            }
            return Err(PersistenceError::Transaction { slot, source });
        }

        tx.commit()
            .await
            .map_err(|source| PersistenceError::Transaction { slot, source })?;

        tracing::info!(
            slot,
            players = snapshot.players.len(),
            location = %snapshot.location,
            "Game saved"
        );
        Ok(())
    }

    async fn load_slot(&self, slot: u32) -> Result<Option<SavedSlot>, PersistenceError> {
        // Read both queries from one snapshot of the database.
        let mut tx = self.pool.begin().await?;

        let row: Option<SlotRow> = sqlx::query_as(
            r#"
            SELECT id, slot, playtime, location, last_saved
            FROM save_states
            WHERE slot = ?
            "#,
        )
        .bind(slot as i64)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tracing::debug!(slot, "No save data in slot");
            return Ok(None);
        };

        let players: Vec<PlayerRow> = sqlx::query_as(
            r#"
            SELECT p.name, p.health, w.name AS weapon_name
            FROM players p
            LEFT JOIN weapons w ON w.id = p.weapon_id
            WHERE p.save_state_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(row.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(SavedSlot {
            slot: row.slot as u32,
            last_saved: row.last_saved,
            snapshot: SlotSnapshot {
                location: row.location,
                playtime_secs: u32::try_from(row.playtime).unwrap_or(0),
                players: players.into_iter().map(PlayerSnapshot::from).collect(),
            },
        }))
    }

    async fn list_slots(&self) -> Result<Vec<SlotSummary>, PersistenceError> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT s.slot, s.location, s.playtime, s.last_saved,
                   COUNT(p.id) AS player_count
            FROM save_states s
            LEFT JOIN players p ON p.save_state_id = s.id
            GROUP BY s.id
            ORDER BY s.slot
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SlotSummary::from).collect())
    }

    async fn delete_slot(&self, slot: u32) -> Result<bool, PersistenceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|source| PersistenceError::Transaction { slot, source })?;

        let removed = remove_slot(&mut tx, slot as i64)
            .await
            .map_err(|source| PersistenceError::Transaction { slot, source })?;

        tx.commit()
            .await
            .map_err(|source| PersistenceError::Transaction { slot, source })?;

        if removed > 0 {
            tracing::info!(slot, "Deleted save slot");
        }
        Ok(removed > 0)
    }

    async fn list_weapons(&self) -> Result<Vec<WeaponRecord>, PersistenceError> {
        Ok(weapon_catalog::list(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saves::Database;

    async fn test_db() -> (Database, SqliteSaveRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteSaveRepository::new(db.pool().clone());
        (db, repo)
    }

    fn sample_snapshot(location: &str) -> SlotSnapshot {
        SlotSnapshot::new(
            location,
            vec![
                PlayerSnapshot::new("Axel", 80, Some("Lead Pipe")),
                PlayerSnapshot::new("Blaze", 100, Some("Knife")),
            ],
        )
        .with_playtime(754)
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let (_db, repo) = test_db().await;
        let data = sample_snapshot("harbor_checkpoint_2");
        repo.save_slot(1, &data).await.unwrap();

        let loaded = repo.load_slot(1).await.unwrap().unwrap();
        assert_eq!(loaded.slot, 1);
        assert_eq!(loaded.snapshot, data);
        assert!(!loaded.last_saved.is_empty());
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (_db, repo) = test_db().await;
        assert_eq!(repo.load_slot(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unarmed_player_loads_without_weapon() {
        let (_db, repo) = test_db().await;
        let data = SlotSnapshot::new("alley", vec![PlayerSnapshot::new("Adam", 55, None)]);
        repo.save_slot(2, &data).await.unwrap();

        let loaded = repo.load_slot(2).await.unwrap().unwrap();
        let player = &loaded.snapshot.players[0];
        assert_eq!(player.weapon, None);
        assert_eq!(player.weapon_label(), "None");
        assert!(repo.list_weapons().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_players_keep_save_order() {
        let (_db, repo) = test_db().await;
        let names = ["Zan", "Axel", "Max", "Blaze"];
        let players = names
            .iter()
            .map(|n| PlayerSnapshot::new(*n, 100, None))
            .collect();
        repo.save_slot(1, &SlotSnapshot::new("bridge", players))
            .await
            .unwrap();

        let loaded = repo.load_slot(1).await.unwrap().unwrap();
        let loaded_names: Vec<&str> = loaded
            .snapshot
            .players
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(loaded_names, names);
    }

    #[tokio::test]
    async fn test_validation_rejects_slot_zero() {
        let (_db, repo) = test_db().await;
        let err = repo.save_slot(0, &sample_snapshot("x")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
        assert!(repo.list_slots().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_rejects_empty_player_name() {
        let (_db, repo) = test_db().await;
        repo.save_slot(1, &sample_snapshot("first")).await.unwrap();

        let bad = SlotSnapshot::new("second", vec![PlayerSnapshot::new("  ", 10, None)]);
        let err = repo.save_slot(1, &bad).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
        assert!(!err.is_retryable());

        let loaded = repo.load_slot(1).await.unwrap().unwrap();
        assert_eq!(loaded.snapshot.location, "first");
    }

    #[tokio::test]
    async fn test_empty_player_list_is_valid() {
        let (_db, repo) = test_db().await;
        repo.save_slot(4, &SlotSnapshot::new("title", vec![]))
            .await
            .unwrap();
        let loaded = repo.load_slot(4).await.unwrap().unwrap();
        assert!(loaded.snapshot.players.is_empty());
    }

    #[tokio::test]
    async fn test_list_slots_summaries() {
        let (_db, repo) = test_db().await;
        repo.save_slot(3, &sample_snapshot("rooftop")).await.unwrap();
        repo.save_slot(1, &SlotSnapshot::new("intro", vec![]))
            .await
            .unwrap();

        let list = repo.list_slots().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].slot, 1);
        assert_eq!(list[0].player_count, 0);
        assert_eq!(list[1].slot, 3);
        assert_eq!(list[1].location, "rooftop");
        assert_eq!(list[1].playtime_secs, 754);
        assert_eq!(list[1].player_count, 2);
    }

    #[tokio::test]
    async fn test_delete_slot_removes_players() {
        let (db, repo) = test_db().await;
        repo.save_slot(2, &sample_snapshot("pier")).await.unwrap();

        assert!(repo.delete_slot(2).await.unwrap());
        assert_eq!(repo.load_slot(2).await.unwrap(), None);

        let players: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM players")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(players.0, 0);
        // Weapons are never removed
        assert_eq!(repo.list_weapons().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_slot_is_not_an_error() {
        let (_db, repo) = test_db().await;
        assert!(!repo.delete_slot(7).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_weapons() {
        let (db, repo) = test_db().await;
        sqlx::query(
            r#"
            CREATE TRIGGER reject_player BEFORE INSERT ON players
            WHEN NEW.name = 'Shiva'
            BEGIN SELECT RAISE(ABORT, 'rejected by test'); END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let data = SlotSnapshot::new(
            "boss_room",
            vec![
                PlayerSnapshot::new("Axel", 100, Some("Grenade")),
                PlayerSnapshot::new("Shiva", 100, None),
            ],
        );
        let err = repo.save_slot(5, &data).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Transaction { slot: 5, .. }));
        assert!(err.is_retryable());

        assert_eq!(repo.load_slot(5).await.unwrap(), None);
        assert!(repo.list_weapons().await.unwrap().is_empty());
    }
}

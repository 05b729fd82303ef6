//! Get-or-create mapping from weapon names to catalog ids.
//!
//! Lookups and inserts run on the caller's transaction, so a rolled back save
//! also removes any weapon rows it created.

use sqlx::{Sqlite, SqlitePool, Transaction};

use super::types::WeaponRecord;

/// Return the id of the weapon called `name`, inserting it first if the
/// catalog has no row with exactly that name.
pub async fn resolve_or_create(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM weapons WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query("INSERT INTO weapons (name) VALUES (?)")
        .bind(name)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();

    tracing::debug!(weapon = name, id, "Added weapon to catalog");
    Ok(id)
}

/// All catalog rows ordered by id.
pub async fn list(pool: &SqlitePool) -> Result<Vec<WeaponRecord>, sqlx::Error> {
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM weapons ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| WeaponRecord { id, name })
        .collect())
}

use super::json_collection::JsonCollection;
use super::score::{compare_entries, ScoreEntry, ScoreValue};
use crate::PersistenceError;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which scores the leaderboard keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep every accepted time, for a ranked top-N over history.
    #[default]
    KeepAll,
    /// Keep only the single fastest time; inserts compare-and-replace.
    KeepBestOnly,
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepAll => f.write_str("keep-all"),
            Self::KeepBestOnly => f.write_str("best-only"),
        }
    }
}

impl FromStr for RetentionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-all" | "keepall" | "all" => Ok(Self::KeepAll),
            "best-only" | "keepbestonly" | "keep-best-only" | "best" => Ok(Self::KeepBestOnly),
            other => Err(format!(
                "unknown retention policy '{}', expected 'keep-all' or 'best-only'",
                other
            )),
        }
    }
}

/// Result of [`LeaderboardStore::insert_score`].
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// Added alongside the existing times (`KeepAll`).
    Appended,
    /// Became the only stored time (`KeepBestOnly`).
    NewBest { previous: Option<ScoreValue> },
    /// Not faster than the stored best; nothing changed (`KeepBestOnly`).
    NotBetter { best: ScoreValue },
}

/// Result of [`LeaderboardStore::delete_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// File-backed leaderboard of completion times, fastest first.
///
/// The store is the only writer of its file and takes `&mut self` for every
/// operation that may load or change the collection. Two stores pointed at
/// the same file will overwrite each other's changes.
pub struct LeaderboardStore {
    scores: JsonCollection<ScoreEntry>,
    retention: RetentionPolicy,
}

impl LeaderboardStore {
    /// Nothing is read until the first operation.
    pub fn new(
        data_dir: &Path,
        database: &str,
        collection: &str,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            scores: JsonCollection::new(data_dir, database, collection),
            retention,
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    pub fn path(&self) -> &Path {
        self.scores.path()
    }

    pub fn is_loaded(&self) -> bool {
        self.scores.is_loaded()
    }

    /// Load the backing file now instead of on first use.
    pub async fn load(&mut self) {
        self.scores.load().await;
    }

    /// Rewrite the backing file. A no-op before the store is loaded.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        self.scores.save().await
    }

    /// Record a completion time in seconds.
    ///
    /// Missing, negative, and non-finite times are rejected before the file
    /// is touched.
    pub async fn insert_score(
        &mut self,
        seconds: Option<f64>,
    ) -> Result<InsertOutcome, PersistenceError> {
        let seconds = validate_seconds(seconds)?;
        let entry = ScoreEntry::now(seconds);

        match self.retention {
            RetentionPolicy::KeepAll => {
                let mut items = self.scores.items().await.to_vec();
                items.push(entry);
                self.scores.commit(items).await?;
                tracing::info!(seconds, "Score added to leaderboard");
                Ok(InsertOutcome::Appended)
            }
            RetentionPolicy::KeepBestOnly => {
                let previous = best_value(self.scores.items().await);
                if let Some(best) = &previous {
                    if ScoreValue::Float(seconds).tolerant_cmp(best) != Ordering::Less {
                        tracing::debug!(seconds, best = %best, "Score not better than current best");
                        return Ok(InsertOutcome::NotBetter { best: best.clone() });
                    }
                }
                self.scores.commit(vec![entry]).await?;
                tracing::info!(seconds, "New best time");
                Ok(InsertOutcome::NewBest { previous })
            }
        }
    }

    /// Every stored entry in stored order.
    pub async fn all_scores(&mut self) -> Vec<ScoreEntry> {
        self.scores.items().await.to_vec()
    }

    /// Entries recorded under `player`, in stored order. Only older files
    /// carry player names.
    pub async fn scores_for_player(&mut self, player: &str) -> Vec<ScoreEntry> {
        self.scores
            .items()
            .await
            .iter()
            .filter(|e| e.player_name.as_deref() == Some(player))
            .cloned()
            .collect()
    }

    /// Up to `n` entries, fastest first. Entries without a value come last;
    /// ties keep their stored order. Negative `n` yields nothing.
    pub async fn top_n(&mut self, n: i64) -> Vec<ScoreEntry> {
        let mut sorted = self.scores.items().await.to_vec();
        sorted.sort_by(compare_entries);
        sorted.truncate(usize::try_from(n).unwrap_or(0));
        sorted
    }

    /// The fastest stored value, if any.
    pub async fn high_score(&mut self) -> Option<ScoreValue> {
        self.top_n(1).await.into_iter().next().and_then(|e| e.value)
    }

    /// Remove the first entry equal to `seconds`. Integer and string-encoded
    /// entries match by numeric value.
    pub async fn delete_score(&mut self, seconds: f64) -> Result<DeleteOutcome, PersistenceError> {
        let target = ScoreValue::Float(seconds);
        let items = self.scores.items().await;
        let found = items.iter().position(|e| {
            e.value
                .as_ref()
                .is_some_and(|v| v.tolerant_cmp(&target) == Ordering::Equal)
        });

        let Some(index) = found else {
            tracing::info!(seconds, "Score not found");
            return Ok(DeleteOutcome::NotFound);
        };

        let mut items = items.to_vec();
        items.remove(index);
        self.scores.commit(items).await?;
        tracing::info!(seconds, "Deleted score");
        Ok(DeleteOutcome::Deleted)
    }

    /// Remove every entry.
    pub async fn clear(&mut self) -> Result<(), PersistenceError> {
        self.scores.commit(Vec::new()).await?;
        tracing::info!("Leaderboard cleared");
        Ok(())
    }
}

fn validate_seconds(seconds: Option<f64>) -> Result<f64, PersistenceError> {
    match seconds {
        None => Err(PersistenceError::validation("score value is missing")),
        Some(s) if !s.is_finite() => Err(PersistenceError::validation(format!(
            "score must be a finite number, got {}",
            s
        ))),
        Some(s) if s < 0.0 => Err(PersistenceError::validation(format!(
            "score cannot be negative, got {}",
            s
        ))),
        Some(s) => Ok(s),
    }
}

fn best_value(items: &[ScoreEntry]) -> Option<ScoreValue> {
    items
        .iter()
        .filter_map(|e| e.value.as_ref())
        .min_by(|a, b| a.tolerant_cmp(b))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path, retention: RetentionPolicy) -> LeaderboardStore {
        LeaderboardStore::new(dir, "ScoreDatabase", "best_times", retention)
    }

    fn values(entries: &[ScoreEntry]) -> Vec<Option<f64>> {
        entries.iter().map(ScoreEntry::seconds).collect()
    }

    #[tokio::test]
    async fn test_best_only_keeps_fastest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepBestOnly);

        assert_eq!(
            store.insert_score(Some(12.5)).await.unwrap(),
            InsertOutcome::NewBest { previous: None }
        );
        assert_eq!(
            store.insert_score(Some(15.0)).await.unwrap(),
            InsertOutcome::NotBetter {
                best: ScoreValue::Float(12.5)
            }
        );
        assert_eq!(
            store.insert_score(Some(9.8)).await.unwrap(),
            InsertOutcome::NewBest {
                previous: Some(ScoreValue::Float(12.5))
            }
        );

        assert_eq!(values(&store.all_scores().await), vec![Some(9.8)]);
        assert_eq!(store.high_score().await, Some(ScoreValue::Float(9.8)));
    }

    #[tokio::test]
    async fn test_best_only_equal_time_is_not_better() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepBestOnly);
        store.insert_score(Some(30.0)).await.unwrap();
        let outcome = store.insert_score(Some(30.0)).await.unwrap();
        assert!(matches!(outcome, InsertOutcome::NotBetter { .. }));
        assert_eq!(store.all_scores().await.len(), 1);
    }

    #[tokio::test]
    async fn test_keep_all_top_n_skips_rejected_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);

        for value in [Some(5.0), None, Some(2.0), None, Some(8.0)] {
            let result = store.insert_score(value).await;
            assert_eq!(result.is_err(), value.is_none());
        }

        let top = store.top_n(3).await;
        assert_eq!(values(&top), vec![Some(2.0), Some(5.0), Some(8.0)]);
    }

    #[tokio::test]
    async fn test_top_n_clamps_and_ignores_negative() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        store.insert_score(Some(3.0)).await.unwrap();
        store.insert_score(Some(1.0)).await.unwrap();

        assert_eq!(store.top_n(10).await.len(), 2);
        assert!(store.top_n(0).await.is_empty());
        assert!(store.top_n(-4).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_scores_change_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        store.insert_score(Some(4.0)).await.unwrap();

        for bad in [None, Some(-1.0), Some(f64::NAN), Some(f64::INFINITY)] {
            let err = store.insert_score(bad).await.unwrap_err();
            assert!(matches!(err, PersistenceError::Validation(_)));
        }
        assert_eq!(values(&store.all_scores().await), vec![Some(4.0)]);
    }

    #[tokio::test]
    async fn test_validation_happens_before_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        assert!(store.insert_score(None).await.is_err());
        assert!(!store.is_loaded());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_delete_score() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        store.insert_score(Some(7.5)).await.unwrap();
        store.insert_score(Some(7.5)).await.unwrap();
        store.insert_score(Some(6.0)).await.unwrap();

        assert_eq!(store.delete_score(7.5).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(values(&store.all_scores().await), vec![Some(7.5), Some(6.0)]);
        assert_eq!(store.delete_score(99.0).await.unwrap(), DeleteOutcome::NotFound);
        assert_eq!(store.all_scores().await.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        store.insert_score(Some(1.0)).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.all_scores().await.is_empty());
        assert_eq!(store.high_score().await, None);
        let mut reopened = store_in(dir.path(), RetentionPolicy::KeepAll);
        assert!(reopened.all_scores().await.is_empty());
    }

    #[tokio::test]
    async fn test_scores_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
            store.insert_score(Some(20.25)).await.unwrap();
            store.insert_score(Some(18.5)).await.unwrap();
        }
        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        assert_eq!(store.high_score().await, Some(ScoreValue::Float(18.5)));
    }

    #[tokio::test]
    async fn test_flush_before_load_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), RetentionPolicy::KeepAll);
        store.flush().await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_legacy_player_name_survives_insert() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("ScoreDatabase");
        std::fs::create_dir_all(&db_dir).unwrap();
        std::fs::write(
            db_dir.join("best_times.json"),
            r#"[{"PlayerName": "Axel", "Score": 42, "Timestamp": "2024-03-01 10:00:00"},
                {"PlayerName": "Blaze", "Score": 50, "Timestamp": "2024-03-02 10:00:00"}]"#,
        )
        .unwrap();

        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        store.insert_score(Some(10.0)).await.unwrap();

        let after = std::fs::read_to_string(store.path()).unwrap();
        assert!(after.contains("Axel"));
        assert!(after.contains("Blaze"));

        let mut reopened = store_in(dir.path(), RetentionPolicy::KeepAll);
        let axel = reopened.scores_for_player("Axel").await;
        assert_eq!(axel.len(), 1);
        assert_eq!(axel[0].value, Some(ScoreValue::Int(42)));
        assert!(reopened.scores_for_player("Max").await.is_empty());
    }

    #[tokio::test]
    async fn test_null_timestamp_keeps_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("ScoreDatabase");
        std::fs::create_dir_all(&db_dir).unwrap();
        std::fs::write(
            db_dir.join("best_times.json"),
            r#"[{"value": 5.0, "timestamp": "t"},
                {"value": 7.0, "timestamp": null},
                {"value": true, "timestamp": "bad"}]"#,
        )
        .unwrap();

        let mut store = store_in(dir.path(), RetentionPolicy::KeepAll);
        assert_eq!(values(&store.all_scores().await), vec![Some(5.0), Some(7.0)]);
    }

    #[tokio::test]
    async fn test_explicit_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), RetentionPolicy::KeepBestOnly);
        assert_eq!(store.retention(), RetentionPolicy::KeepBestOnly);
        store.load().await;
        assert!(store.is_loaded());
        assert!(store.path().exists());
    }

    #[test]
    fn test_retention_policy_parse() {
        assert_eq!("keep-all".parse::<RetentionPolicy>(), Ok(RetentionPolicy::KeepAll));
        assert_eq!("Best-Only".parse::<RetentionPolicy>(), Ok(RetentionPolicy::KeepBestOnly));
        assert!("sometimes".parse::<RetentionPolicy>().is_err());
        assert_eq!(RetentionPolicy::KeepBestOnly.to_string(), "best-only");
    }
}

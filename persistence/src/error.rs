/// Errors from the persistence layer.
///
/// "Not found" is never an error here: absent slots come back as `None`,
/// absent scores as [`crate::leaderboard::DeleteOutcome::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The save schema could not be created. Fatal at startup.
    #[error("Schema setup failed: {0}")]
    Schema(#[source] sqlx::Error),
    /// A save transaction could not commit and was rolled back. The slot is
    /// unchanged; the caller may retry.
    #[error("Transaction for save slot {slot} rolled back: {source}")]
    Transaction {
        slot: u32,
        #[source]
        source: sqlx::Error,
    },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transaction { .. } | Self::Io(_))
    }
}

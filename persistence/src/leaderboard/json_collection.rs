use crate::PersistenceError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// A whole collection of documents kept in one JSON array file, loaded lazily
/// into memory and rewritten in full on every change.
///
/// Layout on disk: `<data_dir>/<database>/<collection>.json`.
pub struct JsonCollection<T> {
    dir: PathBuf,
    path: PathBuf,
    items: Vec<T>,
    loaded: bool,
}

impl<T: Serialize + DeserializeOwned> JsonCollection<T> {
    pub fn new(data_dir: &Path, database: &str, collection: &str) -> Self {
        let dir = data_dir.join(database);
        let path = dir.join(format!("{}.json", collection));
        Self {
            dir,
            path,
            items: Vec::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub async fn ensure_dir(&self) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Load the collection from disk. A no-op once loaded.
    ///
    /// Never fails: unreadable or unparseable files are logged and the
    /// collection starts empty. A missing file is created immediately.
    pub async fn load(&mut self) {
        if self.loaded {
            tracing::debug!("Collection {:?} already loaded", self.path);
            return;
        }

        if let Err(e) = self.ensure_dir().await {
            tracing::warn!("Failed to create collection directory {:?}: {}", self.dir, e);
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                self.items = parse_items(&self.path, &contents);
                self.loaded = true;
                tracing::debug!("Loaded {} documents from {:?}", self.items.len(), self.path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Collection file {:?} does not exist, creating it", self.path);
                self.items = Vec::new();
                self.loaded = true;
                if let Err(e) = self.save().await {
                    tracing::warn!("Failed to create collection file {:?}: {}", self.path, e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read collection file {:?}: {}", self.path, e);
                self.items = Vec::new();
                self.loaded = true;
            }
        }
    }

    /// Rewrite the file from the in-memory collection.
    ///
    /// Does nothing (with a warning) before the collection has been loaded,
    /// so an unloaded collection can never clobber the file.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        if !self.loaded {
            tracing::warn!("Collection {:?} not loaded, skipping save", self.path);
            return Ok(());
        }
        write_items(&self.path, &self.items).await
    }

    /// The loaded documents, loading first if needed.
    pub async fn items(&mut self) -> &[T] {
        self.load().await;
        &self.items
    }

    /// Replace the whole collection. The file is written first; memory is
    /// only updated once the write succeeded.
    pub async fn commit(&mut self, items: Vec<T>) -> Result<(), PersistenceError> {
        self.load().await;
        write_items(&self.path, &items).await?;
        self.items = items;
        Ok(())
    }
}

/// Parse a collection file one document at a time. A document that does not
/// fit `T` is skipped with a warning; the rest of the file is kept.
fn parse_items<T: DeserializeOwned>(path: &Path, contents: &str) -> Vec<T> {
    if contents.trim().is_empty() {
        return Vec::new();
    }
    let documents = match serde_json::from_str::<Option<Vec<serde_json::Value>>>(contents) {
        Ok(documents) => documents.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to parse collection file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    documents
        .into_iter()
        .enumerate()
        .filter_map(|(index, document)| match serde_json::from_value::<T>(document) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping document {} in {:?}: {}", index, path, e);
                None
            }
        })
        .collect()
}

async fn write_items<T: Serialize>(path: &Path, items: &[T]) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(items)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!("Saved {} documents to {:?}", items.len(), path);
    Ok(())
}

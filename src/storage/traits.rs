//! Storage traits and error types
//!
//! This module defines the trait interface for document stores and the
//! associated error types.

use std::collections::HashMap;
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Title cannot be stored: {0:?}")]
    InvalidTitle(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of saving a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The document was written
    Stored,

    /// A document with the same key already existed; nothing was written
    AlreadyPresent,
}

/// A stored person page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Filesystem-safe key derived from the title
    pub key: String,
    pub title: String,
    pub url: String,
    pub html: String,
}

/// Trait for person-document backends
///
/// Implementations are shared by every worker, so all methods take `&self`
/// and must be thread-safe. Writes are idempotent per title key.
pub trait DocumentStore: Send + Sync {
    /// Saves an accepted person page
    ///
    /// # Arguments
    ///
    /// * `title` - The canonical title
    /// * `url` - The page URL
    /// * `html` - The raw document
    ///
    /// # Returns
    ///
    /// `Stored` on first write, `AlreadyPresent` when the title key exists
    fn save(&self, title: &str, url: &Url, html: &str) -> StorageResult<SaveOutcome>;

    /// Returns true if a document with this title's key is stored
    fn contains(&self, title: &str) -> StorageResult<bool>;

    /// Number of stored documents
    fn count(&self) -> StorageResult<u64>;

    /// Loads every stored document keyed by its normalized name
    ///
    /// This is the mapping a co-mention graph is built from.
    fn load_documents(&self) -> StorageResult<HashMap<String, StoredDocument>>;
}

//! In-memory document store

use crate::storage::traits::{DocumentStore, SaveOutcome, StorageError, StorageResult, StoredDocument};
use crate::storage::{document_key, normalize_name};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Document store held entirely in memory
///
/// Used when crawling without a database and in tests. A store built with
/// [`failing`](MemoryStore::failing) rejects every write, which exercises the
/// crawler's storage-error path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<StoredDocument>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail
    pub fn failing() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryStore {
    fn save(&self, title: &str, url: &Url, html: &str) -> StorageResult<SaveOutcome> {
        if self.fail_writes {
            return Err(StorageError::Database("writes disabled".to_string()));
        }

        let key = document_key(title)?;
        let mut documents = self.lock();

        if documents.iter().any(|d| d.key == key) {
            return Ok(SaveOutcome::AlreadyPresent);
        }

        documents.push(StoredDocument {
            key,
            title: title.to_string(),
            url: url.to_string(),
            html: html.to_string(),
        });
        Ok(SaveOutcome::Stored)
    }

    fn contains(&self, title: &str) -> StorageResult<bool> {
        let key = document_key(title)?;
        Ok(self.lock().iter().any(|d| d.key == key))
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(self.lock().len() as u64)
    }

    fn load_documents(&self) -> StorageResult<HashMap<String, StoredDocument>> {
        Ok(self
            .lock()
            .iter()
            .map(|d| (normalize_name(&d.title), d.clone()))
            .collect())
    }
}

//! Storage module for persisting accepted person pages and run records
//!
//! This module handles:
//! - The [`DocumentStore`] interface the crawler writes accepted pages to
//! - SQLite persistence of people and crawl runs
//! - An in-memory store for tests and dry runs
//! - Title key and name normalization shared with downstream consumers

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStorage;
pub use traits::{DocumentStore, SaveOutcome, StorageError, StorageResult, StoredDocument};

use crate::state::CrawlOutcome;

/// Longest key produced by [`document_key`], in characters
pub const MAX_KEY_CHARS: usize = 100;

/// Derives the filesystem-safe storage key for a title
///
/// Characters that are invalid in file names on common platforms
/// (`< > : " / \ | ? *` and control characters) become `_`; surrounding
/// whitespace and dots are trimmed and the result is cut to
/// [`MAX_KEY_CHARS`] characters.
///
/// # Returns
///
/// * `Ok(String)` - The key
/// * `Err(StorageError::InvalidTitle)` - Nothing usable was left
///
/// # Examples
///
/// ```
/// use bio_harvest::storage::document_key;
///
/// assert_eq!(document_key("AC/DC: Bon Scott?").unwrap(), "AC_DC_ Bon Scott_");
/// ```
pub fn document_key(title: &str) -> StorageResult<String> {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let key: String = replaced
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .chars()
        .take(MAX_KEY_CHARS)
        .collect();

    let key = key.trim_end().to_string();
    if key.is_empty() || key.chars().all(|c| c == '_') {
        return Err(StorageError::InvalidTitle(title.to_string()));
    }

    Ok(key)
}

/// Normalizes a person name for matching titles, page names and link text
///
/// Percent-escapes are decoded, underscores become spaces, the text is
/// lowercased, punctuation is dropped and whitespace runs collapse.
///
/// ```
/// use bio_harvest::storage::normalize_name;
///
/// assert_eq!(normalize_name("Vin%C3%ADcius_de_Moraes"), "vinícius de moraes");
/// assert_eq!(normalize_name("  Pelé (futebolista) "), "pelé futebolista");
/// ```
pub fn normalize_name(name: &str) -> String {
    let decoded = if name.contains('%') {
        urlencoding::decode(name)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| name.to_string())
    } else {
        name.to_string()
    };

    let cleaned: String = decoded
        .replace('_', " ")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Represents a crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,

    /// None while the run is in progress
    pub outcome: Option<CrawlOutcome>,

    pub collected: u64,
    pub visited: u64,
    pub success_rate: f64,
    pub elapsed_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_replaces_reserved_characters() {
        assert_eq!(document_key("Maria Silva").unwrap(), "Maria Silva");
        assert_eq!(document_key("a<b>c:d\"e/f\\g|h?i*j").unwrap(), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(document_key("tab\there").unwrap(), "tab_here");
    }

    #[test]
    fn test_document_key_trims_and_truncates() {
        assert_eq!(document_key("  ...Zico.. ").unwrap(), "Zico");

        let long = "á".repeat(150);
        let key = document_key(&long).unwrap();
        assert_eq!(key.chars().count(), MAX_KEY_CHARS);
    }

    #[test]
    fn test_document_key_rejects_empty() {
        assert!(matches!(document_key("   "), Err(StorageError::InvalidTitle(_))));
        assert!(matches!(document_key("???"), Err(StorageError::InvalidTitle(_))));
    }

    #[test]
    fn test_document_key_is_stable() {
        assert_eq!(
            document_key("Machado de Assis").unwrap(),
            document_key("Machado de Assis").unwrap()
        );
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Machado_de_Assis"), "machado de assis");
        assert_eq!(normalize_name("Machado de Assis"), "machado de assis");
        assert_eq!(normalize_name("D. Pedro II"), "d pedro ii");
        assert_eq!(normalize_name("Jean-Paul Sartre"), "jeanpaul sartre");
        assert_eq!(normalize_name("   "), "");
    }
}

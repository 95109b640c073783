//! Rotating pool of outbound request identities
//!
//! An identity is a complete header set (user agent, accept headers,
//! language). Requests draw identities round-robin from one shared pool so no
//! worker owns a fingerprint and consecutive requests do not look alike.

use crate::config::IdentityEntry;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const DEFAULT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en;q=0.8";

const BROWSER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// One immutable outbound header set
#[derive(Debug, Clone)]
pub struct Identity {
    headers: HeaderMap,
}

impl Identity {
    /// Builds an identity from a user agent and optional accept-language.
    ///
    /// Header values that are not valid HTTP header text are skipped rather
    /// than rejected; the user agent is validated at config load.
    pub fn new(user_agent: &str, accept_language: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

        let language = accept_language.unwrap_or(DEFAULT_LANGUAGE);
        if let Ok(value) = HeaderValue::from_str(language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );

        Self { headers }
    }

    /// The full header set sent with a request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The user agent string, if set
    pub fn user_agent(&self) -> &str {
        self.headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// Round-robin pool of identities shared by every worker
#[derive(Debug)]
pub struct IdentityPool {
    identities: Vec<Arc<Identity>>,
    cursor: AtomicUsize,
}

impl IdentityPool {
    /// Creates a pool from configured entries, falling back to the built-in
    /// browser pool when none are configured
    pub fn from_entries(entries: &[IdentityEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let identities = entries
            .iter()
            .map(|e| Arc::new(Identity::new(&e.user_agent, e.accept_language.as_deref())))
            .collect();

        Self {
            identities,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the next identity in rotation
    pub fn next(&self) -> Arc<Identity> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.identities.len();
        Arc::clone(&self.identities[index])
    }

    /// Number of identities in the pool
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        let identities = BROWSER_AGENTS
            .iter()
            .map(|ua| Arc::new(Identity::new(ua, None)))
            .collect();

        Self {
            identities,
            cursor: AtomicUsize::new(0),
        }
    }
}

//! Robots.txt handling module
//!
//! Fetches robots.txt once per site, caches it in-process and answers
//! whether a URL may be crawled. A robots.txt that cannot be fetched or
//! returns a non-success status allows everything.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::RobotsRules;

use crate::url::site_of;
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// Product token matched against `User-agent` groups
pub const ROBOTS_AGENT: &str = "bio-harvest";

/// Per-site robots.txt cache
///
/// The map lock is held while a site's robots.txt is fetched, so each site
/// is requested once even when several workers reach it together.
#[derive(Debug)]
pub struct RobotsGate {
    client: Client,
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsGate {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether `url` may be fetched
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Some(site) = site_of(url) else {
            return true;
        };

        let mut entries = self.entries.lock().await;
        let needs_fetch = entries.get(&site).map_or(true, CachedRobots::is_stale);
        if needs_fetch {
            let rules = fetch_robots(&self.client, &site).await;
            entries.insert(site.clone(), CachedRobots::new(rules));
        }

        entries
            .get(&site)
            .map_or(true, |entry| entry.rules.is_allowed(url.as_str(), ROBOTS_AGENT))
    }

    /// Number of sites with a cached robots.txt
    pub async fn cached_sites(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Fetches and parses `{site}/robots.txt`
///
/// # Arguments
///
/// * `client` - The HTTP client
/// * `site` - The origin, as returned by [`site_of`]
///
/// # Returns
///
/// The parsed rules, or allow-all when the file is unavailable
pub async fn fetch_robots(client: &Client, site: &str) -> RobotsRules {
    let robots_url = format!("{}/robots.txt", site);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!("Failed to fetch {}: {}; allowing all", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(
            "{} returned {}; allowing all",
            robots_url,
            response.status()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsRules::from_content(&body),
        Err(e) => {
            warn!("Failed to read {}: {}; allowing all", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_disallowed_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"))
            .expect(1)
            .mount(&server)
            .await;

        let gate = RobotsGate::new(Client::new());
        let open = Url::parse(&format!("{}/wiki/Zico", server.uri())).unwrap();
        let closed = Url::parse(&format!("{}/private/x", server.uri())).unwrap();

        assert!(gate.is_allowed(&open).await);
        assert!(!gate.is_allowed(&closed).await);
        assert_eq!(gate.cached_sites().await, 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let gate = RobotsGate::new(Client::new());
        let url = Url::parse(&format!("{}/anything", server.uri())).unwrap();
        assert!(gate.is_allowed(&url).await);
    }

    #[tokio::test]
    async fn test_unreachable_robots_allows_all() {
        let rules = fetch_robots(&Client::new(), "http://127.0.0.1:1").await;
        assert!(rules.is_allow_all());
    }
}

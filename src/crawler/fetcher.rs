//! HTTP fetch client
//!
//! This module handles all page requests for the crawler, including:
//! - Building the shared HTTP client
//! - Drawing request headers from the identity pool
//! - Pacing requests with a randomized pre-request delay
//! - Local retries with per-failure backoff windows
//!
//! A fetch either yields a page or a final [`FetchFailure`]; callers never
//! resubmit a failed URL.

use super::retry::{FailureKind, RetryDecision, RetryPolicy};
use crate::config::FetchConfig;
use crate::identity::{Identity, IdentityPool};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: Url,

    /// URL after redirects
    pub final_url: Url,

    pub status: u16,

    pub body: String,

    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Final, non-fatal outcome for a URL whose retries are exhausted
#[derive(Debug, Clone, Error)]
#[error("giving up on {url} after {attempts} attempt(s): {last}")]
pub struct FetchFailure {
    pub url: Url,
    pub attempts: u32,
    pub last: FailureKind,
}

/// Builds the HTTP client shared by every worker
///
/// Per-request headers come from the identity pool, so the client itself
/// carries no user agent.
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.request_timeout_seconds);

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues page requests with identity rotation and retry/backoff
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    identities: Arc<IdentityPool>,
    policy: RetryPolicy,
}

impl FetchClient {
    pub fn new(config: &FetchConfig, identities: Arc<IdentityPool>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            identities,
            policy: RetryPolicy::from_config(config),
        })
    }

    /// The underlying HTTP client, shared with the robots gate
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches one URL
    ///
    /// # Retry Logic
    ///
    /// | Condition          | Action                                        |
    /// |--------------------|-----------------------------------------------|
    /// | 2xx                | Return the page                               |
    /// | HTTP 403           | Block backoff, escalating; optional rotation  |
    /// | HTTP 429           | Rate-limit backoff, escalating; same identity |
    /// | Other status/error | Short transport backoff                       |
    ///
    /// A randomized delay precedes every attempt. After `retry-max-attempts`
    /// the last failure is returned as a [`FetchFailure`].
    ///
    /// `budget` bounds the pauses: pre-request delays are cut short at the
    /// deadline, and no retry is made whose backoff would end past it. Only
    /// the request already in flight may outlast the budget.
    pub async fn fetch(&self, url: &Url, budget: Duration) -> Result<FetchedPage, FetchFailure> {
        let deadline = Instant::now().checked_add(budget);
        let mut identity = self.identities.next();
        let mut attempt = 1;

        loop {
            tokio::time::sleep(until_deadline(self.policy.jitter(), deadline)).await;

            let kind = match self.attempt(url, &identity).await {
                Ok((status, final_url, body)) => {
                    debug!("Fetched {} ({}) on attempt {}", url, status, attempt);
                    return Ok(FetchedPage {
                        url: url.clone(),
                        final_url,
                        status,
                        body,
                        attempts: attempt,
                    });
                }
                Err(kind) => kind,
            };

            match &kind {
                FailureKind::Blocked | FailureKind::RateLimited => {
                    warn!("{} on {} (attempt {})", kind, url, attempt)
                }
                _ => debug!("{} on {} (attempt {})", kind, url, attempt),
            }

            match self.policy.should_retry(&kind, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                    rotate_identity,
                } if ends_before(delay, deadline) => {
                    if rotate_identity {
                        identity = self.identities.next();
                    }
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                decision => {
                    if decision != RetryDecision::GiveUp {
                        debug!("No time left to retry {}", url);
                    }
                    return Err(FetchFailure {
                        url: url.clone(),
                        attempts: attempt,
                        last: kind,
                    });
                }
            }
        }
    }

    /// Sends a single request and reads the body on success
    async fn attempt(
        &self,
        url: &Url,
        identity: &Identity,
    ) -> Result<(u16, Url, String), FailureKind> {
        let response = self
            .client
            .get(url.clone())
            .headers(identity.headers().clone())
            .send()
            .await
            .map_err(|e| FailureKind::Transport(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureKind::from_status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FailureKind::Transport(describe(&e)))?;

        Ok((status.as_u16(), final_url, body))
    }
}

/// Shortens `wait` so it ends no later than `deadline`
fn until_deadline(wait: Duration, deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(deadline) => wait.min(deadline.saturating_duration_since(Instant::now())),
        None => wait,
    }
}

/// True when a pause of `wait` starting now ends before `deadline`
fn ends_before(wait: Duration, deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => Instant::now()
            .checked_add(wait)
            .is_some_and(|end| end < deadline),
        None => true,
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DelayRange, IdentityEntry};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config(attempts: u32) -> FetchConfig {
        FetchConfig {
            request_timeout_seconds: 5,
            retry_max_attempts: attempts,
            inter_request_delay: DelayRange::ZERO,
            transport_backoff: DelayRange::ZERO,
            block_backoff: DelayRange::ZERO,
            rate_limit_backoff: DelayRange::ZERO,
            rotate_identity_on_block: true,
        }
    }

    fn client(attempts: u32) -> FetchClient {
        let pool = IdentityPool::from_entries(&[
            IdentityEntry {
                user_agent: "agent-one".to_string(),
                accept_language: None,
            },
            IdentityEntry {
                user_agent: "agent-two".to_string(),
                accept_language: None,
            },
        ]);
        FetchClient::new(&fast_config(attempts), Arc::new(pool)).unwrap()
    }

    fn page_url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Zico"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Zico</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(3)
            .fetch(&page_url(&server, "/wiki/Zico"), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>Zico</html>");
        assert_eq!(page.attempts, 1);
    }

    #[tokio::test]
    async fn test_block_rotates_identity_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Zico"))
            .and(header("user-agent", "agent-one"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Zico"))
            .and(header("user-agent", "agent-two"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(3)
            .fetch(&page_url(&server, "/wiki/Zico"), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(page.attempts, 2);
        assert_eq!(page.body, "ok");
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let failure = client(3)
            .fetch(&page_url(&server, "/wiki/Zico"), Duration::MAX)
            .await
            .unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.last, FailureKind::RateLimited);
    }

    #[tokio::test]
    async fn test_server_error_is_final_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let failure = client(2)
            .fetch(&page_url(&server, "/wiki/Zico"), Duration::MAX)
            .await
            .unwrap_err();
        assert_eq!(failure.last, FailureKind::Status(500));
        assert!(failure.to_string().contains("after 2 attempt(s)"));
    }

    #[tokio::test]
    async fn test_budget_stops_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = fast_config(3);
        config.rate_limit_backoff = DelayRange::new(2.0, 2.0);
        let pool = IdentityPool::from_entries(&[]);
        let fetcher = FetchClient::new(&config, Arc::new(pool)).unwrap();

        let started = Instant::now();
        let failure = fetcher
            .fetch(&page_url(&server, "/wiki/Zico"), Duration::from_secs(1))
            .await
            .unwrap_err();

        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.last, FailureKind::RateLimited);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_deadline_helpers() {
        let soon = Instant::now().checked_add(Duration::from_millis(200));
        assert!(until_deadline(Duration::from_secs(5), soon) <= Duration::from_millis(200));
        assert_eq!(until_deadline(Duration::from_secs(5), None), Duration::from_secs(5));
        assert!(!ends_before(Duration::from_secs(1), soon));
        assert!(ends_before(Duration::from_millis(10), soon));
        assert!(ends_before(Duration::from_secs(60), None));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let url = Url::parse("http://127.0.0.1:1/wiki/Zico").unwrap();
        let failure = client(1).fetch(&url, Duration::MAX).await.unwrap_err();
        assert!(matches!(failure.last, FailureKind::Transport(_)));
        assert_eq!(failure.attempts, 1);
    }
}

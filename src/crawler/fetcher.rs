//! Rate-limited, retrying fetcher for the two Lodestone endpoints
//!
//! Every request goes through the same composition:
//!
//! 1. [`RetryPolicy::run`] drives the attempts
//! 2. each attempt first waits on the endpoint's [`RateLimiter`]
//! 3. then performs one [`Transport::get`]
//!
//! Listing and detail requests have independent limiters because the site
//! tolerates different request rates for each.

use crate::config::Config;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::transport::Transport;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A request target on the Lodestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// One page of a group's Crystalline Conflict ranking
    Listing { group: String, page: u32 },
    /// A character profile
    Detail { id: u64 },
}

impl Endpoint {
    /// Resolves this endpoint against the site base URL
    pub fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        match self {
            Self::Listing { group, page } => {
                let mut url = base.join("/lodestone/ranking/crystallineconflict/")?;
                url.query_pairs_mut()
                    .append_pair("dcgroup", group)
                    .append_pair("page", &page.to_string());
                Ok(url)
            }
            Self::Detail { id } => base.join(&format!("/lodestone/character/{}/", id)),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing { group, page } => write!(f, "listing({}, page {})", group, page),
            Self::Detail { id } => write!(f, "detail({})", id),
        }
    }
}

/// Successful outcome of a fetch
#[derive(Debug, Clone)]
pub enum Payload {
    /// The document body and how long the exchange took
    Document { body: String, elapsed: Duration },
    /// HTTP 403: the site refuses to show this resource
    Denied,
}

/// A failure that is worth another attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientFailure {
    Status(u16),
    Transport(String),
}

impl fmt::Display for TransientFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP status {}", status),
            Self::Transport(error) => f.write_str(error),
        }
    }
}

/// Terminal failure of one fetch job
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: TransientFailure,
    },

    #[error("access denied for {endpoint}")]
    Denied { endpoint: String },

    #[error("cannot build URL for {endpoint}: {message}")]
    InvalidUrl { endpoint: String, message: String },
}

/// Append-only series of detail request latencies
///
/// Written by every detail worker, drained once when the run ends.
#[derive(Debug, Default)]
pub struct LatencyLog {
    samples: Mutex<Vec<Duration>>,
}

impl LatencyLog {
    pub fn record(&self, elapsed: Duration) {
        // Samples survive a worker panicking mid-push
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        samples.push(elapsed);
    }

    /// Removes and returns every recorded sample
    pub fn take(&self) -> Vec<Duration> {
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *samples)
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetcher shared by the listing crawl and the detail workers
pub struct Fetcher {
    base_url: Url,
    transport: Arc<dyn Transport>,
    listing_limiter: RateLimiter,
    detail_limiter: RateLimiter,
    retry: RetryPolicy,
    latencies: LatencyLog,
}

impl Fetcher {
    pub fn new(
        base_url: Url,
        transport: Arc<dyn Transport>,
        listing_limiter: RateLimiter,
        detail_limiter: RateLimiter,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base_url,
            transport,
            listing_limiter,
            detail_limiter,
            retry,
            latencies: LatencyLog::default(),
        }
    }

    /// Builds a fetcher with the limits and retry settings from `config`
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&config.crawler.base_url)?;
        let retry = RetryPolicy::new(
            config.crawler.max_attempts,
            config.crawler.backoff_base(),
            config.crawler.max_backoff(),
        );

        Ok(Self::new(
            base_url,
            transport,
            RateLimiter::from_limit(&config.rate_limit.listing),
            RateLimiter::from_limit(&config.rate_limit.detail),
            retry,
        ))
    }

    /// Fetches one listing page
    ///
    /// A 403 on a listing page is terminal for that page, unlike profiles.
    pub async fn fetch_listing(&self, group: &str, page: u32) -> Result<String, FetchError> {
        let endpoint = Endpoint::Listing {
            group: group.to_string(),
            page,
        };

        match self.fetch(&endpoint, &self.listing_limiter).await? {
            Payload::Document { body, .. } => Ok(body),
            Payload::Denied => Err(FetchError::Denied {
                endpoint: endpoint.to_string(),
            }),
        }
    }

    /// Fetches one character profile
    ///
    /// Returns [`Payload::Denied`] when the profile is private. The latency
    /// of every successful fetch is recorded.
    pub async fn fetch_detail(&self, id: u64) -> Result<Payload, FetchError> {
        let endpoint = Endpoint::Detail { id };
        let payload = self.fetch(&endpoint, &self.detail_limiter).await?;

        if let Payload::Document { elapsed, .. } = &payload {
            self.latencies.record(*elapsed);
        }

        Ok(payload)
    }

    async fn fetch(
        &self,
        endpoint: &Endpoint,
        limiter: &RateLimiter,
    ) -> Result<Payload, FetchError> {
        let target = endpoint
            .url(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let label = endpoint.to_string();
        let url = target.as_str();
        let transport = self.transport.as_ref();

        self.retry
            .run(&label, |_| async move {
                limiter.acquire().await;
                tracing::trace!("GET {}", url);
                transport.get(url).await
            })
            .await
    }

    /// Drains the detail latency series
    pub fn take_latencies(&self) -> Vec<Duration> {
        self.latencies.take()
    }

    pub fn latencies(&self) -> &LatencyLog {
        &self.latencies
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::*;
    use crate::crawler::transport::TransportError;

    #[test]
    fn test_listing_url() {
        let base = Url::parse("https://eu.finalfantasyxiv.com").unwrap();
        let url = Endpoint::Listing {
            group: "Chaos".to_string(),
            page: 3,
        }
        .url(&base)
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://eu.finalfantasyxiv.com/lodestone/ranking/crystallineconflict/?dcgroup=Chaos&page=3"
        );
    }

    #[test]
    fn test_detail_url() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let url = Endpoint::Detail { id: 999 }.url(&base).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/lodestone/character/999/");
    }

    #[test]
    fn test_latency_log_survives_poisoned_lock() {
        let log = Arc::new(LatencyLog::default());
        log.record(Duration::from_millis(5));
        log.record(Duration::from_millis(7));

        let poisoner = Arc::clone(&log);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.samples.lock().unwrap();
            panic!("worker died holding the latency lock");
        })
        .join();
        assert!(result.is_err());
        assert!(log.samples.is_poisoned());

        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());
        assert_eq!(log.take().len(), 2);
    }

    #[tokio::test]
    async fn test_detail_records_latency_only_on_success() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .route("/character/1/", |_| ok("<html></html>"))
                .route("/character/2/", |_| status(403, "")),
        );
        let fetcher = fetcher(transport, 3);

        assert!(matches!(
            fetcher.fetch_detail(1).await,
            Ok(Payload::Document { .. })
        ));
        assert!(matches!(fetcher.fetch_detail(2).await, Ok(Payload::Denied)));

        let latencies = fetcher.take_latencies();
        assert_eq!(latencies, vec![Duration::from_millis(15)]);
        assert!(fetcher.latencies().is_empty());
    }

    #[tokio::test]
    async fn test_listing_denied_is_an_error() {
        let transport = Arc::new(
            ScriptedTransport::new().route("crystallineconflict", |_| status(403, "")),
        );
        let fetcher = fetcher(transport, 3);

        let result = fetcher.fetch_listing("Chaos", 1).await;
        assert!(matches!(result, Err(FetchError::Denied { .. })));
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let transport = Arc::new(ScriptedTransport::new().route("crystallineconflict", |_| {
            Err(TransportError::Timeout)
        }));
        let fetcher = fetcher(transport.clone(), 4);

        let result = fetcher.fetch_listing("Chaos", 1).await;
        assert!(matches!(
            result,
            Err(FetchError::Exhausted { attempts: 4, .. })
        ));
        assert_eq!(transport.requests().len(), 4);
    }
}

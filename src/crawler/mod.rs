//! Crawl orchestration
//!
//! This module contains the two-stage harvest pipeline:
//! - Rate-limited, retrying fetches over a [`Transport`]
//! - The per-group listing walk ([`ListingCrawler`])
//! - Bounded-concurrency profile enrichment ([`DetailWorkerPool`])
//! - Overall run coordination ([`Coordinator`])

mod coordinator;
mod fetcher;
mod listing;
mod rate_limiter;
mod retry;
mod transport;
mod workers;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, EntrantSet, RunReport};
pub use fetcher::{Endpoint, FetchError, Fetcher, LatencyLog, Payload, TransientFailure};
pub use listing::{GroupCrawl, GroupOutcome, ListingCrawler};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use transport::{
    build_http_client, ReqwestTransport, Transport, TransportError, TransportResponse,
};
pub use workers::{DetailWorkerPool, PoolReport};

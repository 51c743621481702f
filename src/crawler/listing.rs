//! Per-group leaderboard walk
//!
//! Pages of one group are fetched strictly in order, starting at page 1.
//! The walk ends at the first of:
//!
//! - a page with fewer rows than a full page
//! - `max_pages` pages fetched
//! - a terminal fetch or extraction failure
//! - cancellation (checked between pages)
//!
//! Entrants already gathered are kept in every case.

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::extract::{ExtractError, RecordExtractor};
use crate::model::Entrant;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Why the walk of a group stopped
#[derive(Debug, Clone)]
pub enum GroupOutcome {
    /// Every configured page was full
    MaxPagesReached,
    /// The last page had fewer rows than a full page
    ShortPage { rows: usize },
    FetchFailed(FetchError),
    ExtractFailed(ExtractError),
    Cancelled,
}

impl GroupOutcome {
    /// True when the group stopped for a reason other than running out of rows
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::ExtractFailed(_))
    }
}

impl fmt::Display for GroupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPagesReached => f.write_str("page limit reached"),
            Self::ShortPage { rows: 0 } => f.write_str("empty page"),
            Self::ShortPage { rows } => write!(f, "short page ({} rows)", rows),
            Self::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            Self::ExtractFailed(e) => write!(f, "unreadable page: {}", e),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of walking one group
#[derive(Debug, Clone)]
pub struct GroupCrawl {
    pub group: String,
    /// Entrant skeletons in page order, then in-page order
    pub entrants: Vec<Entrant>,
    pub pages_fetched: u32,
    /// Rows dropped for missing or malformed required fields
    pub rejected: usize,
    pub outcome: GroupOutcome,
}

pub struct ListingCrawler {
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn RecordExtractor>,
    max_pages: u32,
    page_size: usize,
}

impl ListingCrawler {
    pub fn new(
        fetcher: Arc<Fetcher>,
        extractor: Arc<dyn RecordExtractor>,
        max_pages: u32,
        page_size: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            max_pages,
            page_size,
        }
    }

    /// Walks the leaderboard of `group`
    pub async fn crawl(&self, group: &str, cancel: &CancellationToken) -> GroupCrawl {
        let mut crawl = GroupCrawl {
            group: group.to_string(),
            entrants: Vec::new(),
            pages_fetched: 0,
            rejected: 0,
            outcome: GroupOutcome::MaxPagesReached,
        };

        for page in 1..=self.max_pages {
            if cancel.is_cancelled() {
                tracing::info!(group, page, "Listing walk cancelled");
                crawl.outcome = GroupOutcome::Cancelled;
                return crawl;
            }

            let body = match self.fetcher.fetch_listing(group, page).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(group, page, "Listing fetch failed, abandoning group: {}", e);
                    crawl.outcome = GroupOutcome::FetchFailed(e);
                    return crawl;
                }
            };
            crawl.pages_fetched += 1;

            let listing = match self.extractor.extract_listing(&body) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::error!(group, page, "Listing page unreadable: {}", e);
                    crawl.outcome = GroupOutcome::ExtractFailed(e);
                    return crawl;
                }
            };

            for rejected in &listing.rejected {
                tracing::warn!(
                    group,
                    page,
                    row = rejected.index,
                    "Skipping leaderboard row: {}",
                    rejected.error
                );
            }

            let rows = listing.rows();
            crawl.rejected += listing.rejected.len();
            tracing::debug!(
                group,
                page,
                rows,
                accepted = listing.entrants.len(),
                "Listing page parsed"
            );
            crawl.entrants.extend(listing.entrants);

            if rows < self.page_size {
                if rows == 0 {
                    tracing::info!(group, page, "Empty listing page, group complete");
                } else {
                    tracing::warn!(
                        group,
                        page,
                        rows,
                        expected = self.page_size,
                        "Short listing page, group complete"
                    );
                }
                crawl.outcome = GroupOutcome::ShortPage { rows };
                return crawl;
            }
        }

        tracing::info!(
            group,
            pages = crawl.pages_fetched,
            "Reached page limit for group"
        );
        crawl
    }
}

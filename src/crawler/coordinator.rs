//! Harvest run orchestration
//!
//! A run goes through three phases:
//! 1. Walk the listing of every configured group, merging entrants into an
//!    [`EntrantSet`] under the configured duplicate policy
//! 2. Enrich the whole set through the [`DetailWorkerPool`]
//! 3. Archive the set and compute [`RunStatistics`]
//!
//! One group failing or stopping early never aborts the run. Only storage
//! errors are returned from [`Coordinator::run`].

use crate::config::{Config, DuplicatePolicy};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::listing::ListingCrawler;
use crate::crawler::transport::ReqwestTransport;
use crate::crawler::workers::DetailWorkerPool;
use crate::extract::{LodestoneExtractor, RecordExtractor};
use crate::model::Entrant;
use crate::output::{GroupStatistics, LatencySummary, RunStatistics};
use crate::storage::{open_persistence, Persistence, SaveReceipt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Run-wide entrant collection enforcing id uniqueness
#[derive(Debug)]
pub struct EntrantSet {
    policy: DuplicatePolicy,
    entrants: Vec<Entrant>,
    seen: HashSet<u64>,
    duplicates: usize,
}

impl EntrantSet {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            entrants: Vec::new(),
            seen: HashSet::new(),
            duplicates: 0,
        }
    }

    /// Appends `entrants` in order; an already-seen id is never overwritten
    pub fn extend(&mut self, entrants: impl IntoIterator<Item = Entrant>) {
        for entrant in entrants {
            if self.seen.insert(entrant.id) {
                self.entrants.push(entrant);
                continue;
            }

            self.duplicates += 1;
            match self.policy {
                DuplicatePolicy::KeepFirst => {
                    tracing::warn!(
                        id = entrant.id,
                        group = %entrant.group,
                        "Duplicate entrant id, keeping the first occurrence"
                    );
                }
                DuplicatePolicy::FlagAndKeep => {
                    tracing::warn!(
                        id = entrant.id,
                        group = %entrant.group,
                        "Duplicate entrant id, keeping both occurrences"
                    );
                    self.entrants.push(entrant);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }

    /// Number of repeated ids seen so far
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn into_vec(self) -> Vec<Entrant> {
        self.entrants
    }
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunReport {
    pub statistics: RunStatistics,
    /// The final set, in listing order
    pub entrants: Vec<Entrant>,
    /// None when there was nothing to archive
    pub receipt: Option<SaveReceipt>,
    pub cancelled: bool,
}

/// Main harvest coordinator
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn RecordExtractor>,
    persistence: Box<dyn Persistence>,
}

impl Coordinator {
    /// Builds the HTTP transport, extractor and archive from `config`
    ///
    /// `config_hash` is recorded by archives that keep run metadata.
    pub fn new(config: Config, config_hash: &str) -> crate::Result<Self> {
        let transport = ReqwestTransport::from_config(&config.user_agent)?;
        let fetcher = Fetcher::from_config(&config, Arc::new(transport))?;
        let extractor = LodestoneExtractor::new()?;
        let persistence = open_persistence(&config.output, config_hash)?;

        Ok(Self::with_parts(
            config,
            fetcher,
            Arc::new(extractor),
            persistence,
        ))
    }

    /// Assembles a coordinator from already-built parts
    pub fn with_parts(
        config: Config,
        fetcher: Fetcher,
        extractor: Arc<dyn RecordExtractor>,
        persistence: Box<dyn Persistence>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            extractor,
            persistence,
        }
    }

    /// Runs the harvest to completion or cancellation
    ///
    /// After cancellation no new pages or profiles are requested, and
    /// whatever was gathered is still archived.
    pub async fn run(&mut self, cancel: &CancellationToken) -> crate::Result<RunReport> {
        let started = Instant::now();
        let crawler_config = &self.config.crawler;
        tracing::info!(
            "Starting harvest of {} groups from {}",
            crawler_config.groups.len(),
            self.fetcher.base_url()
        );

        let listing = ListingCrawler::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
            crawler_config.max_pages,
            crawler_config.page_size,
        );

        let mut statistics = RunStatistics::default();
        let mut set = EntrantSet::new(crawler_config.duplicate_policy);

        for group in &crawler_config.groups {
            if cancel.is_cancelled() {
                tracing::info!("Cancelled, skipping remaining groups");
                break;
            }

            let crawl = listing.crawl(group, cancel).await;
            tracing::info!(
                group = %crawl.group,
                entrants = crawl.entrants.len(),
                pages = crawl.pages_fetched,
                "Group finished: {}",
                crawl.outcome
            );

            statistics.rejected_rows += crawl.rejected;
            if crawl.outcome.is_failure() {
                statistics.failed_groups += 1;
            }
            statistics.groups.push(GroupStatistics {
                group: crawl.group,
                entrants: crawl.entrants.len(),
                pages: crawl.pages_fetched,
                outcome: crawl.outcome.to_string(),
            });

            set.extend(crawl.entrants);
        }

        statistics.duplicates = set.duplicates();
        tracing::info!("Listing phase gathered {} entrants", set.len());

        let pool = DetailWorkerPool::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
            crawler_config.workers,
        );
        let pool_report = pool.run(set.into_vec(), cancel).await;

        statistics.enriched = pool_report.enriched;
        statistics.denied = pool_report.denied;
        statistics.failed_details = pool_report.failed;
        statistics.unclaimed = pool_report.unclaimed;
        let entrants = pool_report.entrants;
        statistics.entrants = entrants.len();

        let receipt = if entrants.is_empty() {
            tracing::warn!("No entrants gathered, nothing to archive");
            self.persistence.record_empty_run()?;
            None
        } else {
            Some(self.persistence.save(&entrants)?)
        };

        statistics.latency = LatencySummary::from_samples(&self.fetcher.take_latencies());
        statistics.duration = started.elapsed();

        if let Some(latency) = &statistics.latency {
            tracing::info!(
                "Profile latency: min {:?}, max {:?}, median {:?}",
                latency.min,
                latency.max,
                latency.median
            );
        }
        tracing::info!(
            "Harvest completed: {} entrants in {:?}",
            statistics.entrants,
            statistics.duration
        );

        Ok(RunReport {
            statistics,
            entrants,
            receipt,
            cancelled: cancel.is_cancelled(),
        })
    }
}

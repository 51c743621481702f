//! Bounded-concurrency profile enrichment
//!
//! Every entrant becomes one job in a shared queue before any worker starts.
//! `min(workers, jobs)` tokio tasks then claim jobs one at a time until the
//! queue is empty or the run is cancelled. A job that is claimed is always
//! finished; a job that is never claimed is handed back untouched.
//!
//! Each claimed job runs in its own task and its result is stored as soon as
//! it finishes, so a panicking job costs only that entrant's job lookup.

use crate::crawler::fetcher::{Fetcher, Payload};
use crate::extract::RecordExtractor;
use crate::model::{Category, Entrant};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

type JobQueue = Arc<Mutex<VecDeque<(usize, Entrant)>>>;
type Slots = Arc<Mutex<Vec<Option<Entrant>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Enriched,
    Denied,
    Failed,
}

#[derive(Debug, Default)]
struct Tally {
    completed: AtomicUsize,
    enriched: AtomicUsize,
    denied: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    /// Records one finished job, returning how many have finished so far
    fn record(&self, outcome: JobOutcome) -> usize {
        let counter = match outcome {
            JobOutcome::Enriched => &self.enriched,
            JobOutcome::Denied => &self.denied,
            JobOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// What the pool did with its entrants
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Every entrant handed to the pool, in the original order
    pub entrants: Vec<Entrant>,
    pub enriched: usize,
    /// Private profiles, left as UNKNOWN
    pub denied: usize,
    /// Jobs whose fetch or extraction failed, left as UNKNOWN
    pub failed: usize,
    /// Jobs never claimed because the run was cancelled
    pub unclaimed: usize,
}

pub struct DetailWorkerPool {
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn RecordExtractor>,
    workers: usize,
}

impl DetailWorkerPool {
    /// `workers` of zero is treated as one
    pub fn new(fetcher: Arc<Fetcher>, extractor: Arc<dyn RecordExtractor>, workers: usize) -> Self {
        Self {
            fetcher,
            extractor,
            workers: workers.max(1),
        }
    }

    /// Enriches `entrants` with the job shown on each profile
    ///
    /// Returns once every claimed job has finished.
    pub async fn run(&self, entrants: Vec<Entrant>, cancel: &CancellationToken) -> PoolReport {
        let total = entrants.len();
        if total == 0 {
            return PoolReport::default();
        }

        let skeletons = entrants.clone();
        let queue: JobQueue = Arc::new(Mutex::new(entrants.into_iter().enumerate().collect()));
        let slots: Slots = Arc::new(Mutex::new((0..total).map(|_| None).collect()));
        let tally = Arc::new(Tally::default());
        let worker_count = self.workers.min(total);

        tracing::info!(
            "Enriching {} entrants with {} workers",
            total,
            worker_count
        );

        let mut handles = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let queue = Arc::clone(&queue);
            let slots = Arc::clone(&slots);
            let tally = Arc::clone(&tally);
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                while !cancel.is_cancelled() {
                    let job = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
                    let Some((index, entrant)) = job else {
                        break;
                    };

                    let skeleton = entrant.clone();
                    let fetcher = Arc::clone(&fetcher);
                    let extractor = Arc::clone(&extractor);
                    let job = tokio::spawn(async move {
                        let mut entrant = entrant;
                        let outcome = enrich(&fetcher, extractor.as_ref(), &mut entrant).await;
                        (entrant, outcome)
                    });

                    let (entrant, outcome) = match job.await {
                        Ok(finished) => finished,
                        Err(e) => {
                            tracing::error!(worker, id = skeleton.id, "Profile job aborted: {}", e);
                            let mut entrant = skeleton;
                            entrant.category = Category::Unknown;
                            (entrant, JobOutcome::Failed)
                        }
                    };

                    let done = tally.record(outcome);
                    tracing::info!(
                        worker,
                        id = entrant.id,
                        job = %entrant.category,
                        "Profile {}/{} ({:.1}%)",
                        done,
                        total,
                        done as f64 * 100.0 / total as f64
                    );

                    slots.lock().unwrap_or_else(|e| e.into_inner())[index] = Some(entrant);
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Detail worker aborted: {}", e);
            }
        }

        let mut report = PoolReport {
            enriched: tally.enriched.load(Ordering::SeqCst),
            denied: tally.denied.load(Ordering::SeqCst),
            failed: tally.failed.load(Ordering::SeqCst),
            ..PoolReport::default()
        };

        let mut slots = std::mem::take(&mut *slots.lock().unwrap_or_else(|e| e.into_inner()));

        let leftover: Vec<(usize, Entrant)> = queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        if !leftover.is_empty() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    unclaimed = leftover.len(),
                    "Enrichment cancelled, returning unclaimed entrants as UNKNOWN"
                );
                report.unclaimed = leftover.len();
            } else {
                tracing::error!(
                    remaining = leftover.len(),
                    "Every detail worker stopped with jobs still queued"
                );
                report.failed += leftover.len();
            }
        }
        for (index, entrant) in leftover {
            slots[index] = Some(entrant);
        }

        // Claimed by a worker that died before storing a result
        for (slot, skeleton) in slots.iter_mut().zip(skeletons) {
            if slot.is_none() {
                tracing::error!(id = skeleton.id, "Profile job lost, keeping listing data");
                report.failed += 1;
                *slot = Some(Entrant {
                    category: Category::Unknown,
                    ..skeleton
                });
            }
        }

        report.entrants = slots.into_iter().flatten().collect();
        report
    }
}

/// Runs one job; the entrant keeps `Category::Unknown` unless enrichment succeeds
async fn enrich(
    fetcher: &Fetcher,
    extractor: &dyn RecordExtractor,
    entrant: &mut Entrant,
) -> JobOutcome {
    match fetcher.fetch_detail(entrant.id).await {
        Ok(Payload::Document { body, .. }) => match extractor.extract_category(&body) {
            Ok(category) => {
                entrant.category = category;
                JobOutcome::Enriched
            }
            Err(e) => {
                tracing::warn!(id = entrant.id, "Cannot read job from profile: {}", e);
                entrant.category = Category::Unknown;
                JobOutcome::Failed
            }
        },
        Ok(Payload::Denied) => {
            tracing::info!(id = entrant.id, "Profile is private");
            entrant.category = Category::Unknown;
            JobOutcome::Denied
        }
        Err(e) => {
            tracing::error!(id = entrant.id, "Profile fetch failed: {}", e);
            entrant.category = Category::Unknown;
            JobOutcome::Failed
        }
    }
}

//! Run statistics
//!
//! Collected by the coordinator at the end of a run and printed by the CLI.

use std::time::Duration;

/// Min/max/median over the detail request latencies of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub samples: usize,
    pub min: Duration,
    pub max: Duration,
    /// Mean of the two middle samples when the count is even
    pub median: Duration,
}

impl LatencySummary {
    /// Returns None for an empty series
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2
        } else {
            sorted[mid]
        };

        Some(Self {
            samples: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median,
        })
    }
}

/// Per-group listing totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatistics {
    pub group: String,
    pub entrants: usize,
    pub pages: u32,
    /// How the walk ended, e.g. "short page (30 rows)"
    pub outcome: String,
}

/// Harvest run summary
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Entrants in the final set
    pub entrants: usize,

    pub groups: Vec<GroupStatistics>,

    /// Listing rows dropped for missing required fields
    pub rejected_rows: usize,

    /// Entrants whose id was already seen earlier in the run
    pub duplicates: usize,

    /// Groups whose walk stopped on a fetch or extraction failure
    pub failed_groups: usize,

    pub enriched: usize,
    pub denied: usize,
    pub failed_details: usize,
    pub unclaimed: usize,

    pub latency: Option<LatencySummary>,

    /// Wall-clock time of the whole run
    pub duration: Duration,
}

impl RunStatistics {
    /// Structural anomalies seen during the listing phase
    pub fn anomalies(&self) -> usize {
        self.rejected_rows + self.duplicates
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Entrants: {}", stats.entrants);
    println!("  Duration: {:.1}s", stats.duration.as_secs_f64());
    println!();

    println!("Groups:");
    for group in &stats.groups {
        println!(
            "  {}: {} entrants over {} pages, {}",
            group.group, group.entrants, group.pages, group.outcome
        );
    }
    println!();

    println!("Profiles:");
    let total = stats.enriched + stats.denied + stats.failed_details + stats.unclaimed;
    for (label, count) in [
        ("Enriched", stats.enriched),
        ("Private", stats.denied),
        ("Failed", stats.failed_details),
        ("Not attempted", stats.unclaimed),
    ] {
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }
    println!();

    if stats.anomalies() > 0 || stats.failed_groups > 0 {
        println!("Anomalies:");
        println!("  Rejected rows: {}", stats.rejected_rows);
        println!("  Duplicate ids: {}", stats.duplicates);
        println!("  Failed groups: {}", stats.failed_groups);
        println!();
    }

    match &stats.latency {
        Some(latency) => println!(
            "Profile latency: min {:?}, max {:?}, median {:?} ({} samples)",
            latency.min, latency.max, latency.median, latency.samples
        ),
        None => println!("Profile latency: no samples"),
    }
}

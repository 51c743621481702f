//! Run summaries
//!
//! This module handles:
//! - Detail latency summaries (min, max, median)
//! - Per-run statistics and their console rendering

pub mod stats;

pub use stats::{print_statistics, GroupStatistics, LatencySummary, RunStatistics};

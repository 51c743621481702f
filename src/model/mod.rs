//! Data model for harvested leaderboard entries
//!
//! # Components
//!
//! - `Entrant`: one ranked participant with its listing fields and job
//! - `Category`: the closed set of job codes plus `UNKNOWN`

mod category;
mod entrant;

// Re-export main types
pub use category::Category;
pub use entrant::{Entrant, ENTRANT_COLUMNS, NO_TIER};

#[cfg(test)]
pub(crate) use entrant::sample_entrant;

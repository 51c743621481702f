//! Record extraction from Lodestone markup
//!
//! This module turns fetched documents into data:
//! - Leaderboard listing pages into entrant skeletons
//! - Character profile pages into a job [`Category`]
//!
//! The crawler only talks to the [`RecordExtractor`] trait, so tests can
//! swap in a scripted extractor and the HTML layout stays in one place.

mod listing;
mod profile;

pub use listing::parse_points_or_wins;

use crate::model::{Category, Entrant};
use listing::ListingSelectors;
use profile::ProfileSelectors;
use thiserror::Error;

/// Errors raised while pulling fields out of a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid value for '{field}': '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Unrecognised job icon: {0}")]
    UnknownIcon(String),
}

/// A listing row that could not be turned into an entrant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Position of the row on its page (0-based)
    pub index: usize,
    pub error: ExtractError,
}

/// Everything extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Valid rows, in page order
    pub entrants: Vec<Entrant>,
    /// Rows missing a required field
    pub rejected: Vec<RejectedRow>,
}

impl ListingPage {
    /// Number of leaderboard rows present on the page, valid or not
    pub fn rows(&self) -> usize {
        self.entrants.len() + self.rejected.len()
    }
}

/// Site-specific field extraction used by the crawler
///
/// `extract_listing` returns an empty page (not an error) when the document
/// simply has no rows; an error means the document could not be examined at
/// all.
pub trait RecordExtractor: Send + Sync {
    fn extract_listing(&self, document: &str) -> Result<ListingPage, ExtractError>;

    fn extract_category(&self, document: &str) -> Result<Category, ExtractError>;
}

/// Extractor for the Lodestone Crystalline Conflict ranking and profile pages
pub struct LodestoneExtractor {
    listing: ListingSelectors,
    profile: ProfileSelectors,
}

impl LodestoneExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            listing: ListingSelectors::new()?,
            profile: ProfileSelectors::new()?,
        })
    }
}

impl RecordExtractor for LodestoneExtractor {
    fn extract_listing(&self, document: &str) -> Result<ListingPage, ExtractError> {
        Ok(listing::parse_listing(document, &self.listing))
    }

    fn extract_category(&self, document: &str) -> Result<Category, ExtractError> {
        profile::parse_category(document, &self.profile)
    }
}

/// Compiles a CSS selector, keeping the message of a parse failure
pub(crate) fn selector(css: &str) -> Result<scraper::Selector, ExtractError> {
    scraper::Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

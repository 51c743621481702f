use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for a harvest run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Lodestone front-end to harvest from (region subdomain included)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Competitive groups (data centers) to walk, in order
    pub groups: Vec<String>,

    /// Maximum number of listing pages requested per group
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of rows on a full listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Number of concurrent detail workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempts per request before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// What to do when the same entrant id is listed twice
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl CrawlerConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Resolution policy for entrant ids seen more than once in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The first listing of an id wins, later ones are reported and dropped
    #[default]
    KeepFirst,
    /// Every listing is kept, later ones are reported
    FlagAndKeep,
}

/// Per-endpoint request ceilings
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_listing_limit")]
    pub listing: EndpointLimit,
    #[serde(default = "default_detail_limit")]
    pub detail: EndpointLimit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            listing: default_listing_limit(),
            detail: default_detail_limit(),
        }
    }
}

/// At most `calls` requests in any trailing `period-ms` window
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EndpointLimit {
    pub calls: u32,
    pub period_ms: u64,
}

impl EndpointLimit {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
    /// URL or mail address for crawler-related contact
    pub contact: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact: None,
        }
    }
}

impl UserAgentConfig {
    /// Format: Name/Version (+Contact)
    pub fn header_value(&self) -> String {
        match &self.contact {
            Some(contact) => format!("{}/{} (+{})", self.name, self.version, contact),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Directory receiving one CSV file per UTC day
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            archive_dir: default_archive_dir(),
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
}

fn default_base_url() -> String {
    "https://eu.finalfantasyxiv.com".to_string()
}

fn default_max_pages() -> u32 {
    6
}

fn default_page_size() -> usize {
    50
}

fn default_workers() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    8
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_listing_limit() -> EndpointLimit {
    EndpointLimit {
        calls: 2,
        period_ms: 1000,
    }
}

fn default_detail_limit() -> EndpointLimit {
    EndpointLimit {
        calls: 3,
        period_ms: 1000,
    }
}

fn default_archive_dir() -> String {
    "./archive".to_string()
}

fn default_database_path() -> String {
    "./archive/harvest.db".to_string()
}

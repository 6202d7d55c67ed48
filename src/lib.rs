//! Seo-Sweep: a same-site SEO crawler
//!
//! This crate walks every reachable in-domain page from a seed URL and feeds each
//! fetched page to a pluggable visitor that extracts report rows (missing meta
//! descriptions, dead links, image alt text and size, heading structure, page titles,
//! security headers and mixed content).

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;
pub mod visitor;

use thiserror::Error;

/// Main error type for Seo-Sweep operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Report output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid URL '{raw}': {reason}")]
    Invalid { raw: String, reason: String },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for Seo-Sweep operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CancellationToken, CrawlStatus, CrawlSummary, Crawler};
pub use state::{CrawlState, ProgressSample};
pub use self::url::{is_same_site, normalize, seed_url};
pub use visitor::{ReportKind, Visitor};

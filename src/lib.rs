//! Articlesa: an article source tree builder
//!
//! This crate discovers, for a starting article URL, the graph of articles it
//! cites by recursively following outbound links up to a bounded depth, while
//! streaming progress events to a client as each article is fetched, parsed,
//! and expanded.

pub mod article;
pub mod config;
pub mod crawler;
pub mod fetch;
pub mod graph;
pub mod state;
pub mod store;
pub mod stream;
pub mod url;

use thiserror::Error;

/// Main error type for session-level Articlesa operations
///
/// These errors abort a whole crawl session. Failures confined to a single
/// article are reported as [`FetchError`] and never escalate to this type.
#[derive(Debug, Error)]
pub enum ArticlesaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Seed URL {url} is on a blacklisted host")]
    BlockedSeed { url: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition for {url_hash}: {from:?} -> {to:?}")]
    InvalidTransition {
        url_hash: String,
        from: state::NodeState,
        to: state::NodeState,
    },

    #[error("Unknown node: {0}")]
    UnknownNode(String),
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

    #[error("Invalid blacklist entry: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid relative path: {0}")]
    InvalidRelativePath(String),
}

/// Errors confined to a single article fetch
///
/// Every variant is converted into a `node_failure` event by the crawler;
/// none of them stops sibling nodes from being processed.
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    #[error("Redirect resolution failed for {url} (status {status:?})")]
    RedirectResolutionFailed { url: String, status: Option<u16> },

    #[error("No article text could be extracted from {url}")]
    ContentExtractionFailed { url: String },

    #[error("Fetch of {url} timed out after {after_ms}ms")]
    Timeout { url: String, after_ms: u64 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Fetch of {url} aborted: {message}")]
    Aborted { url: String, message: String },

    #[error(transparent)]
    Url(#[from] UrlError),
}

impl FetchError {
    /// HTTP status associated with the failure, if there was one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RedirectResolutionFailed { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for Articlesa operations
pub type Result<T> = std::result::Result<T, ArticlesaError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for article fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use article::ParsedArticle;
pub use config::Config;
pub use crawler::{CrawlOutcome, CrawlRequest, CrawlSession, CrawlSettings, Orchestrator};
pub use graph::{ArticleNode, CrawlGraph};
pub use state::NodeState;
pub use url::{normalize_url, resolve_relative, url_hash, HostBlacklist};

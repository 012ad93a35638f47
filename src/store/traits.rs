//! Store traits and error types
//!
//! This module defines the trait interface for article store backends and
//! associated error types.

use crate::article::ParsedArticle;
use thiserror::Error;

/// Errors that can occur during store operations
///
/// Callers in the crawl path treat every variant as "store unavailable":
/// a failed read is a cache miss and a failed write is logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Counts of what the store holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub articles: u64,
    pub citations: u64,
}

/// Durable article cache keyed by canonical URL
///
/// Implementations must be shareable between the fetch tasks of a crawl
/// session, hence `Send + Sync` and `&self` receivers.
pub trait ArticleStore: Send + Sync {
    /// Gets a stored article
    ///
    /// # Returns
    ///
    /// * `Ok(Some(article))` - The article is stored
    /// * `Ok(None)` - No article for this URL
    fn get(&self, canonical_url: &str) -> StoreResult<Option<ParsedArticle>>;

    /// Stores an article under `canonical_url`, replacing an earlier copy
    ///
    /// `canonical_url` is the URL the article was requested as; it may
    /// differ from `article.url` when the request was redirected. When
    /// `parent_url` is given, the citation `parent_url -> canonical_url` is
    /// recorded as well.
    fn put(
        &self,
        canonical_url: &str,
        article: &ParsedArticle,
        parent_url: Option<&str>,
    ) -> StoreResult<()>;

    /// URLs of stored articles that cite `canonical_url`
    fn citing_urls(&self, canonical_url: &str) -> StoreResult<Vec<String>>;

    /// Counts of stored articles and citations
    fn stats(&self) -> StoreResult<StoreStats>;
}

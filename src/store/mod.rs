//! Article store
//!
//! Durable cache of parsed articles keyed by canonical URL, plus the
//! citation edges seen while crawling. The crawler consults the store before
//! dispatching a fetch and writes every freshly fetched article back.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteArticleStore;
pub use traits::{ArticleStore, StoreError, StoreResult, StoreStats};

use std::path::Path;

/// Opens the store configured at `path`
pub fn open_store(path: &Path) -> StoreResult<SqliteArticleStore> {
    SqliteArticleStore::open(path)
}

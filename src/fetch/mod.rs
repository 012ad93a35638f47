//! Article fetching
//!
//! The crawler only depends on the [`ArticleFetcher`] trait. The live
//! implementation, [`HttpArticleFetcher`], resolves redirects, downloads the
//! page, extracts its fields and cleans up its outbound links.

mod extract;
mod http;
mod redirect;

pub use extract::{extract_article, ExtractedPage};
pub use http::{build_http_client, HttpArticleFetcher};
pub use redirect::RedirectResolver;

use crate::article::ParsedArticle;
use crate::FetchResult;
use async_trait::async_trait;

/// Retrieves and parses one article
///
/// Implementations are shared by every fetch task of a crawl session.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetches the article at `url`
    ///
    /// The returned article's `url` is the canonical URL the content was
    /// actually served from, which may differ from `url` after redirects.
    async fn fetch(&self, url: &str) -> FetchResult<ParsedArticle>;
}

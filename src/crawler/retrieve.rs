//! Per-node retrieve step: store lookup, live fetch, store write
//!
//! Each step runs in its own spawned task so that a slow or hung fetch
//! never holds up the orchestrator loop.

use crate::article::ParsedArticle;
use crate::fetch::ArticleFetcher;
use crate::store::ArticleStore;
use crate::{FetchError, FetchResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Collaborators shared by every retrieve task of an orchestrator
pub(crate) struct RetrieveContext {
    pub fetcher: Arc<dyn ArticleFetcher>,
    pub store: Option<Arc<dyn ArticleStore>>,
    /// Bounded fetch worker pool
    pub workers: Arc<Semaphore>,
    pub fetch_timeout: Duration,
}

/// Produces the article for `url`, from the store when possible
///
/// The wait for a worker permit is not counted; the fetch timeout bounds
/// only the work done while the permit is held.
pub(crate) async fn retrieve(
    ctx: Arc<RetrieveContext>,
    url: String,
    parent_url: Option<String>,
) -> FetchResult<ParsedArticle> {
    let _permit = ctx
        .workers
        .acquire()
        .await
        .map_err(|e| FetchError::Aborted {
            url: url.clone(),
            message: e.to_string(),
        })?;

    let timeout = ctx.fetch_timeout;
    match tokio::time::timeout(timeout, retrieve_inner(&ctx, &url, parent_url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url,
            after_ms: timeout.as_millis() as u64,
        }),
    }
}

async fn retrieve_inner(
    ctx: &RetrieveContext,
    url: &str,
    parent_url: Option<String>,
) -> FetchResult<ParsedArticle> {
    if let Some(store) = &ctx.store {
        if let Some(article) = store_get(store.clone(), url.to_string()).await {
            tracing::debug!("Store hit for {}", url);
            if parent_url.is_some() {
                // Record the citation from this parent as well
                store_put(store.clone(), url.to_string(), article.clone(), parent_url).await;
            }
            return Ok(article);
        }
    }

    tracing::debug!("Fetching {}", url);
    let article = ctx.fetcher.fetch(url).await?;

    if let Some(store) = &ctx.store {
        store_put(store.clone(), url.to_string(), article.clone(), parent_url).await;
    }

    Ok(article)
}

/// Store read; any failure counts as a miss
async fn store_get(store: Arc<dyn ArticleStore>, url: String) -> Option<ParsedArticle> {
    let lookup_url = url.clone();
    match tokio::task::spawn_blocking(move || store.get(&lookup_url)).await {
        Ok(Ok(hit)) => hit,
        Ok(Err(e)) => {
            tracing::warn!("Store read failed for {}: {}", url, e);
            None
        }
        Err(e) => {
            tracing::warn!("Store read task failed for {}: {}", url, e);
            None
        }
    }
}

/// Best-effort store write, keyed by the URL the article was requested as
async fn store_put(
    store: Arc<dyn ArticleStore>,
    url: String,
    article: ParsedArticle,
    parent_url: Option<String>,
) {
    let key = url.clone();
    let result = tokio::task::spawn_blocking(move || {
        store.put(&key, &article, parent_url.as_deref())
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Store write failed for {}: {}", url, e),
        Err(e) => tracing::warn!("Store write task failed for {}: {}", url, e),
    }
}

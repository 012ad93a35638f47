//! HTTP article fetcher
//!
//! This module turns a URL into a [`ParsedArticle`]:
//! - Building the HTTP client with the configured user agent
//! - Resolving the article's redirects through the probe gate
//! - GET at the final URL and field extraction
//! - Resolving, filtering, probing and deduplicating outbound links

use crate::article::ParsedArticle;
use crate::config::{Config, UserAgentConfig};
use crate::fetch::extract::extract_article;
use crate::fetch::redirect::RedirectResolver;
use crate::fetch::ArticleFetcher;
use crate::url::{extract_host, normalize_url, resolve_relative, HostBlacklist};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `max_redirects` - Redirect hops a single request may follow
///
/// # Example
///
/// ```no_run
/// use articlesa::config::UserAgentConfig;
/// use articlesa::fetch::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), 10).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    max_redirects: usize,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Live article fetcher backed by `reqwest` and `scraper`
#[derive(Debug, Clone)]
pub struct HttpArticleFetcher {
    client: Client,
    resolver: RedirectResolver,
    blacklist: Arc<HostBlacklist>,
}

impl HttpArticleFetcher {
    /// Creates a fetcher from the crawler and user agent configuration
    pub fn new(config: &Config, blacklist: Arc<HostBlacklist>) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            config.crawler.max_redirects as usize,
        )?;
        let resolver =
            RedirectResolver::new(client.clone(), config.crawler.max_redirect_probes as usize);

        Ok(Self {
            client,
            resolver,
            blacklist,
        })
    }

    /// Fetches and parses one article
    ///
    /// # Request Flow
    ///
    /// 1. Probe redirects with HEAD (falls back to the requested URL)
    /// 2. GET the final URL; a non-success status fails the article
    /// 3. Extract fields; an empty body fails the article
    /// 4. Run the outbound links through [`HttpArticleFetcher::process_links`]
    pub async fn fetch_article(&self, url: &str) -> FetchResult<ParsedArticle> {
        let target = match self.resolver.check_redirect(url).await {
            Some(final_url) => final_url,
            None => url.to_string(),
        };

        let response = self.client.get(&target).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Network {
                    url: target.clone(),
                    message: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchError::Network {
                    url: target.clone(),
                    message: "Connection refused".to_string(),
                }
            } else {
                FetchError::Network {
                    url: target.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let final_url = normalize_url(response.url().as_str())?;

        if !status.is_success() {
            return Err(FetchError::RedirectResolutionFailed {
                url: url.to_string(),
                status: Some(status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: final_url.clone(),
            message: e.to_string(),
        })?;

        let page = extract_article(&body);
        if page.text.is_empty() {
            return Err(FetchError::ContentExtractionFailed { url: final_url });
        }

        let links = self.process_links(&page.hrefs, &final_url).await;
        tracing::debug!(
            "Parsed {} ({} chars, {} links)",
            final_url,
            page.text.len(),
            links.len()
        );

        let mut article = ParsedArticle::new(
            final_url,
            page.title.unwrap_or_default(),
            page.text,
        )
        .with_links(links)
        .with_authors(page.authors);
        article.published = page.published;

        Ok(article)
    }

    /// Resolves raw hrefs into the article's outbound links
    ///
    /// Links are made absolute against `base_url`, filtered by the blacklist
    /// both before and after their redirects are resolved, normalized and
    /// deduplicated in first-seen order.
    pub async fn process_links(&self, hrefs: &[String], base_url: &str) -> Vec<String> {
        let candidates: Vec<String> = hrefs
            .iter()
            .filter_map(|href| absolutize(href, base_url))
            .filter(|link| extract_host(link).is_some())
            .filter(|link| {
                let blocked = self.blacklist.is_url_blocked(link);
                if blocked {
                    tracing::trace!("Dropping blacklisted link {}", link);
                }
                !blocked
            })
            .collect();

        let resolved = join_all(
            candidates
                .iter()
                .map(|link| self.resolver.check_redirect(link)),
        )
        .await;

        let mut seen = HashSet::new();
        resolved
            .into_iter()
            .flatten()
            .filter(|link| {
                let blocked = self.blacklist.is_url_blocked(link);
                if blocked {
                    tracing::trace!("Dropping link redirected to blacklisted host {}", link);
                }
                !blocked
            })
            .filter_map(|link| normalize_url(&link).ok())
            .filter(|link| seen.insert(link.clone()))
            .collect()
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<ParsedArticle> {
        self.fetch_article(url).await
    }
}

/// Turns a raw href into an absolute URL string
///
/// Site-relative paths go through [`resolve_relative`]; protocol-relative
/// links take the base URL's scheme. Any other relative form is dropped.
fn absolutize(href: &str, base_url: &str) -> Option<String> {
    if let Some(rest) = href.strip_prefix("//") {
        let scheme = Url::parse(base_url).ok()?.scheme().to_string();
        return Some(format!("{}://{}", scheme, rest));
    }

    if href.starts_with('/') {
        return match resolve_relative(href, base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Dropping link {}: {}", href, e);
                None
            }
        };
    }

    let url = Url::parse(href).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

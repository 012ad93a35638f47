//! Redirect resolution behind a bounded concurrency gate

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Resolves where a URL finally lands by sending a HEAD request
///
/// At most `max_probes` HEAD requests are in flight at any time across every
/// fetch sharing this resolver.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    client: Client,
    gate: Arc<Semaphore>,
}

impl RedirectResolver {
    pub fn new(client: Client, max_probes: usize) -> Self {
        Self {
            client,
            gate: Arc::new(Semaphore::new(max_probes.max(1))),
        }
    }

    /// Follows redirects from `url` and returns the final URL
    ///
    /// # Returns
    ///
    /// * `Some(url)` - The final URL (the input itself when there was no redirect,
    ///   or when the server does not allow HEAD)
    /// * `None` - The probe failed or ended on an error status
    pub async fn check_redirect(&self, url: &str) -> Option<String> {
        let _permit = self.gate.acquire().await.ok()?;

        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Redirect probe failed for {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            // Nothing to learn from a server that refuses HEAD
            return Some(url.to_string());
        }

        if !status.is_success() {
            tracing::debug!("Redirect probe for {} ended with HTTP {}", url, status);
            return None;
        }

        let final_url = response.url().to_string();
        if final_url != url {
            tracing::trace!("{} redirects to {}", url, final_url);
        }
        Some(final_url)
    }
}

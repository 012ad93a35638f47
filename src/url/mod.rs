//! URL handling module for Articlesa
//!
//! This module provides URL normalization, relative path resolution,
//! stable URL hashing, host extraction, and the host blacklist.

mod blacklist;
mod domain;
mod hash;
mod normalize;

pub use blacklist::HostBlacklist;
pub use domain::extract_host;
pub use hash::url_hash;
pub use normalize::{normalize_url, resolve_relative};

/// A canonical URL together with its hash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl {
    pub url: String,
    pub hash: String,
}

impl CanonicalUrl {
    /// Normalizes a raw URL and computes its hash
    pub fn parse(raw: &str) -> crate::UrlResult<Self> {
        let url = normalize_url(raw)?;
        let hash = url_hash(&url);
        Ok(Self { url, hash })
    }
}

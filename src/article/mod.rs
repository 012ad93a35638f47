//! Parsed article records
//!
//! A `ParsedArticle` is what the fetch collaborator returns and what the
//! article store persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::url::extract_host;

/// Structured fields extracted from one article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedArticle {
    /// Canonical URL the content was retrieved from (after redirects)
    pub url: String,

    pub title: String,

    /// Body text; always non-empty for articles produced by the fetcher
    pub text: String,

    pub authors: Vec<String>,

    /// Absolute outbound links, deduplicated
    pub links: Vec<String>,

    /// Publish date as found in the page, usually ISO 8601
    pub published: Option<String>,

    pub parsed_at_utc: DateTime<Utc>,
}

impl ParsedArticle {
    /// Creates an article with no authors, links, or publish date
    pub fn new(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
            authors: Vec::new(),
            links: Vec::new(),
            published: None,
            parsed_at_utc: Utc::now(),
        }
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }

    /// Host of the publisher
    pub fn publisher_host(&self) -> Option<String> {
        extract_host(&self.url)
    }
}

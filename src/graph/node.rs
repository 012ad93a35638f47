use crate::article::ParsedArticle;
use crate::state::NodeState;
use crate::url::url_hash;
use crate::ArticlesaError;
use chrono::{DateTime, Utc};

/// One URL in the crawl
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleNode {
    /// Canonical URL; identity of the node
    pub url: String,

    /// `url_hash(url)`; map key and wire correlation id
    pub url_hash: String,

    /// Distance from the root along the edge that created this node
    pub depth: u32,

    /// Hash of the node whose expansion discovered this one; `None` for the root
    pub parent_hash: Option<String>,

    pub state: NodeState,

    // Populated only once Rendered
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub text: Option<String>,
    pub outbound_links: Vec<String>,
    pub published_at: Option<String>,
    pub parsed_at: Option<DateTime<Utc>>,

    /// Final URL the article was served from, when it differs from `url`
    pub resolved_url: Option<String>,

    /// Populated only once Failed
    pub failure_reason: Option<String>,
}

impl ArticleNode {
    /// Creates a node in the `Pending` state
    pub fn new(url: impl Into<String>, depth: u32, parent_hash: Option<String>) -> Self {
        let url = url.into();
        let url_hash = url_hash(&url);
        Self {
            url,
            url_hash,
            depth,
            parent_hash,
            state: NodeState::Pending,
            title: None,
            authors: Vec::new(),
            text: None,
            outbound_links: Vec::new(),
            published_at: None,
            parsed_at: None,
            resolved_url: None,
            failure_reason: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_hash.is_none()
    }

    /// Moves the node to `next`, enforcing the state machine
    pub(crate) fn transition(&mut self, next: NodeState) -> Result<(), ArticlesaError> {
        if !self.state.can_transition_to(next) {
            return Err(ArticlesaError::InvalidTransition {
                url_hash: self.url_hash.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Copies the article fields into the node and marks it Rendered
    ///
    /// The node keeps the identity it was created with even when the article
    /// was served from a different (redirected) URL.
    pub(crate) fn render(&mut self, article: &ParsedArticle) -> Result<(), ArticlesaError> {
        self.transition(NodeState::Rendered)?;
        self.title = Some(article.title.clone());
        self.authors = article.authors.clone();
        self.text = Some(article.text.clone());
        self.outbound_links = article.links.clone();
        self.published_at = article.published.clone();
        self.parsed_at = Some(article.parsed_at_utc);
        if article.url != self.url {
            self.resolved_url = Some(article.url.clone());
        }
        Ok(())
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) -> Result<(), ArticlesaError> {
        self.transition(NodeState::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }
}

//! Wire events describing node lifecycle transitions

use crate::graph::ArticleNode;
use crate::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Client reconnection delay advertised with every event (milliseconds)
pub const DEFAULT_RETRY_MS: u32 = 15_000;

/// Event id used for `stream_begin`
pub const BEGIN_ID: &str = "begin";

/// Event id used for `stream_end`
pub const END_ID: &str = "done";

/// Event type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StreamBegin,
    NodeProcessing,
    NodeRender,
    NodeFailure,
    StreamEnd,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreamBegin => "stream_begin",
            Self::NodeProcessing => "node_processing",
            Self::NodeRender => "node_render",
            Self::NodeFailure => "node_failure",
            Self::StreamEnd => "stream_end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `node_processing` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingPayload<'a> {
    pub url_hash: &'a str,
    pub depth: u32,
    pub parent_hash: Option<&'a str>,
}

/// `node_render` payload: rendered fields without the body text
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload<'a> {
    pub url: &'a str,
    pub title: Option<&'a str>,
    pub authors: &'a [String],
    pub links: &'a [String],
    pub published: Option<&'a str>,
    pub parsed_at_utc: Option<DateTime<Utc>>,
    pub url_hash: &'a str,
    pub depth: u32,
}

/// `node_failure` payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailurePayload<'a> {
    pub url_hash: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// One event of the progress stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// Node url hash, or a session literal for begin/end
    pub id: String,
    pub event: EventKind,
    /// JSON-encoded payload
    pub data: String,
    pub retry: u32,
}

impl StreamEvent {
    fn new(id: impl Into<String>, event: EventKind, data: String) -> Self {
        Self {
            id: id.into(),
            event,
            data,
            retry: DEFAULT_RETRY_MS,
        }
    }

    pub fn begin() -> Self {
        Self::new(BEGIN_ID, EventKind::StreamBegin, "{}".to_string())
    }

    pub fn end() -> Self {
        Self::new(END_ID, EventKind::StreamEnd, "{}".to_string())
    }

    pub fn processing(node: &ArticleNode) -> Self {
        let payload = ProcessingPayload {
            url_hash: &node.url_hash,
            depth: node.depth,
            parent_hash: node.parent_hash.as_deref(),
        };
        Self::new(&node.url_hash, EventKind::NodeProcessing, encode(&payload))
    }

    pub fn render(node: &ArticleNode) -> Self {
        let payload = RenderPayload {
            url: node.resolved_url.as_deref().unwrap_or(&node.url),
            title: node.title.as_deref(),
            authors: &node.authors,
            links: &node.outbound_links,
            published: node.published_at.as_deref(),
            parsed_at_utc: node.parsed_at,
            url_hash: &node.url_hash,
            depth: node.depth,
        };
        Self::new(&node.url_hash, EventKind::NodeRender, encode(&payload))
    }

    pub fn failure(url_hash: &str, error: &FetchError) -> Self {
        let payload = FailurePayload {
            url_hash,
            message: error.to_string(),
            status_code: error.status_code(),
        };
        Self::new(url_hash, EventKind::NodeFailure, encode(&payload))
    }

    /// Parses the payload back into a JSON value
    pub fn data_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.data).unwrap_or(serde_json::Value::Null)
    }
}

fn encode<T: Serialize>(payload: &T) -> String {
    // Payloads are plain structs of strings and numbers
    serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
}

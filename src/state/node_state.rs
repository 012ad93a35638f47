/// Node state definitions for tracking crawl progress
///
/// This module defines the lifecycle of a single article node in the crawl.
use serde::Serialize;
use std::fmt;

/// Represents the current state of an article node
///
/// ```text
/// Pending -> Processing -> Rendered
///                       \-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    // ===== Active States =====
    /// Node has been created but its fetch has not been dispatched
    Pending,

    /// Node's fetch is in flight
    Processing,

    // ===== Terminal States =====
    /// Article was fetched and parsed
    Rendered,

    /// Article could not be fetched or parsed
    Failed,
}

impl NodeState {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rendered | Self::Failed)
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Rendered)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Converts the node state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Rendered => "rendered",
            Self::Failed => "failed",
        }
    }

    /// Parses a node state from its string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "rendered" => Some(Self::Rendered),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible node states
    pub fn all_states() -> [Self; 4] {
        [Self::Pending, Self::Processing, Self::Rendered, Self::Failed]
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! State module for tracking crawl progress
//!
//! - `NodeState`: lifecycle of a single article node (pending, processing,
//!   rendered, failed)

mod node_state;

pub use node_state::NodeState;

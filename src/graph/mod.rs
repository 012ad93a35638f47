//! Crawl graph model
//!
//! The graph is an arena of [`ArticleNode`]s keyed by url hash, plus an
//! ordered list of discovery/citation edges. It is owned and mutated by a
//! single orchestrator loop for the lifetime of one crawl session.

mod node;

pub use node::ArticleNode;

use crate::article::ParsedArticle;
use crate::state::NodeState;
use crate::url::url_hash;
use crate::ArticlesaError;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A directed edge from the node that linked to the node that was linked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent_hash: String,
    pub child_hash: String,
}

/// Outcome of offering a discovered link to the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// A new node was created (already Processing) and linked; its fetch
    /// must be dispatched by the caller
    Created(String),

    /// The URL already had a node; only an edge was added
    Linked(String),

    /// The URL already had a node and the edge already existed
    Duplicate(String),

    /// The link pointed back at its own parent
    SelfLink,
}

/// Counts describing a graph at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub processing: usize,
    pub rendered: usize,
    pub failed: usize,
    pub max_depth_reached: u32,
    pub nodes_by_depth: BTreeMap<u32, usize>,
}

/// Node and edge set for one crawl session
#[derive(Debug, Clone)]
pub struct CrawlGraph {
    root_hash: String,
    nodes: HashMap<String, ArticleNode>,
    edges: Vec<Edge>,
    edge_set: HashSet<Edge>,
}

impl CrawlGraph {
    /// Creates a graph holding only the root node, already Processing
    ///
    /// `root_url` must be canonical.
    pub fn new(root_url: &str) -> Self {
        let mut root = ArticleNode::new(root_url, 0, None);
        root.state = NodeState::Processing;
        let root_hash = root.url_hash.clone();

        let mut nodes = HashMap::new();
        nodes.insert(root_hash.clone(), root);

        Self {
            root_hash,
            nodes,
            edges: Vec::new(),
            edge_set: HashSet::new(),
        }
    }

    pub fn root_hash(&self) -> &str {
        &self.root_hash
    }

    pub fn root(&self) -> &ArticleNode {
        // The root is inserted in `new` and nodes are never removed
        &self.nodes[&self.root_hash]
    }

    pub fn get(&self, hash: &str) -> Option<&ArticleNode> {
        self.nodes.get(hash)
    }

    /// Looks up a node by canonical URL
    pub fn get_by_url(&self, canonical_url: &str) -> Option<&ArticleNode> {
        self.nodes.get(&url_hash(canonical_url))
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.nodes.contains_key(hash)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ArticleNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Hashes of the nodes `hash` links to, in discovery order
    pub fn children_of(&self, hash: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.parent_hash == hash)
            .map(|e| e.child_hash.as_str())
            .collect()
    }

    /// Hashes of the nodes that link to `hash`
    pub fn parents_of(&self, hash: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.child_hash == hash)
            .map(|e| e.parent_hash.as_str())
            .collect()
    }

    /// Offers a link discovered while expanding `parent_hash`
    ///
    /// The first discovery of a canonical URL creates its node at
    /// `parent.depth + 1`; later discoveries only add an edge.
    pub fn admit_child(
        &mut self,
        parent_hash: &str,
        child_url: &str,
    ) -> Result<Admission, ArticlesaError> {
        let parent_depth = self
            .nodes
            .get(parent_hash)
            .map(|p| p.depth)
            .ok_or_else(|| ArticlesaError::UnknownNode(parent_hash.to_string()))?;

        let child_hash = url_hash(child_url);
        if child_hash == parent_hash {
            return Ok(Admission::SelfLink);
        }

        let edge = Edge {
            parent_hash: parent_hash.to_string(),
            child_hash: child_hash.clone(),
        };

        if self.nodes.contains_key(&child_hash) {
            if self.edge_set.contains(&edge) {
                return Ok(Admission::Duplicate(child_hash));
            }
            self.push_edge(edge);
            return Ok(Admission::Linked(child_hash));
        }

        let mut child = ArticleNode::new(child_url, parent_depth + 1, Some(parent_hash.to_string()));
        child.transition(NodeState::Processing)?;
        self.nodes.insert(child_hash.clone(), child);
        self.push_edge(edge);

        Ok(Admission::Created(child_hash))
    }

    fn push_edge(&mut self, edge: Edge) {
        self.edge_set.insert(edge.clone());
        self.edges.push(edge);
    }

    /// Marks a node Rendered with the fetched article's fields
    pub fn mark_rendered(
        &mut self,
        hash: &str,
        article: &ParsedArticle,
    ) -> Result<&ArticleNode, ArticlesaError> {
        let node = self.node_mut(hash)?;
        node.render(article)?;
        Ok(node)
    }

    /// Marks a node Failed
    pub fn mark_failed(
        &mut self,
        hash: &str,
        reason: impl Into<String>,
    ) -> Result<&ArticleNode, ArticlesaError> {
        let node = self.node_mut(hash)?;
        node.fail(reason)?;
        Ok(node)
    }

    fn node_mut(&mut self, hash: &str) -> Result<&mut ArticleNode, ArticlesaError> {
        self.nodes
            .get_mut(hash)
            .ok_or_else(|| ArticlesaError::UnknownNode(hash.to_string()))
    }

    /// True iff every node is Rendered, Failed, or at/below the depth ceiling
    pub fn is_complete(&self, max_depth: u32) -> bool {
        self.nodes
            .values()
            .all(|n| n.state.is_terminal() || n.depth >= max_depth)
    }

    /// Nodes whose fetch has not resolved yet
    pub fn nodes_in_progress(&self) -> Vec<&ArticleNode> {
        self.nodes.values().filter(|n| n.state.is_active()).collect()
    }

    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            ..Default::default()
        };

        for node in self.nodes.values() {
            match node.state {
                NodeState::Pending | NodeState::Processing => summary.processing += 1,
                NodeState::Rendered => summary.rendered += 1,
                NodeState::Failed => summary.failed += 1,
            }
            summary.max_depth_reached = summary.max_depth_reached.max(node.depth);
            *summary.nodes_by_depth.entry(node.depth).or_insert(0) += 1;
        }

        summary
    }
}

//! Arena-allocated configuration trees.
//!
//! A [`ValueGraph`] holds every node of a loaded document in a flat arena and
//! addresses them by [`NodeId`]. Parents refer to children by id, so two parents can
//! point at the very same child. That is how YAML anchors and aliases survive
//! loading, and it is what lets the object builder tell "the same sub-tree reached
//! twice" apart from "two sub-trees that happen to look alike".
//!
//! # Examples
//!
//! ```rust
//! use useful::value::{Node, ValueGraph};
//!
//! let mut graph = ValueGraph::new();
//! let size = graph.scalar(3);
//! let args = graph.mapping([("size", size)]);
//! let widget = graph.mapping([("pkg.Widget", args)]);
//! // Both keys share one node: an alias.
//! let root = graph.mapping([("svc", widget), ("other", widget)]);
//! graph.set_root(root);
//!
//! match graph.node(root) {
//!     Node::Mapping(entries) => assert_eq!(entries["svc"], entries["other"]),
//!     _ => unreachable!(),
//! }
//! ```

mod scalar;

pub use scalar::Scalar;

use indexmap::IndexMap;
use std::fmt;

/// Index of a node inside a [`ValueGraph`] arena.
///
/// Equality of ids is node identity, not structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of a [`ValueGraph`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered string-keyed mapping
    Mapping(IndexMap<String, NodeId>),
    /// Ordered list
    Sequence(Vec<NodeId>),
    /// Leaf value
    Scalar(Scalar),
}

/// A configuration document stored as an arena of [`Node`]s.
///
/// A fresh graph contains a single null scalar that acts as root until
/// [`set_root`](ValueGraph::set_root) is called, so [`root`](ValueGraph::root) is
/// always valid.
#[derive(Debug, Clone)]
pub struct ValueGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for ValueGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueGraph {
    /// Create a graph whose root is `null`.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Scalar(Scalar::Null)],
            root: NodeId(0),
        }
    }

    /// Create a graph holding a single scalar.
    pub fn from_scalar(scalar: impl Into<Scalar>) -> Self {
        Self {
            nodes: vec![Node::Scalar(scalar.into())],
            root: NodeId(0),
        }
    }

    /// Build a graph from a JSON value. JSON has no aliases, so every node is distinct.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut graph = Self::new();
        let root = graph.insert_json(value);
        graph.set_root(root);
        graph
    }

    /// The root node id.
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Make `id` the root of the document.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// Number of nodes in the arena, including unreachable ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a graph owns at least its initial root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every node in the arena, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Borrow a node.
    ///
    /// Ids are only ever handed out by this graph, so they are always in range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Replace a node in place, keeping its identity.
    ///
    /// Every parent that referenced `id` now sees the new content.
    pub fn replace(&mut self, id: NodeId, node: Node) {
        self.nodes[id.0] = node;
    }

    /// Append a node and return its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Append a scalar node.
    pub fn scalar(&mut self, value: impl Into<Scalar>) -> NodeId {
        self.push(Node::Scalar(value.into()))
    }

    /// Append a mapping node from `(key, child)` pairs.
    pub fn mapping<K, I>(&mut self, entries: I) -> NodeId
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, NodeId)>,
    {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.push(Node::Mapping(entries))
    }

    /// Append a sequence node.
    pub fn sequence(&mut self, items: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.push(Node::Sequence(items.into_iter().collect()))
    }

    /// Append the nodes of a JSON value and return the id of its top node.
    pub fn insert_json(&mut self, value: &serde_json::Value) -> NodeId {
        use serde_json::Value;

        match value {
            Value::Null => self.scalar(Scalar::Null),
            Value::Bool(b) => self.scalar(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => self.scalar(i),
                None => self.scalar(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => self.scalar(s.as_str()),
            Value::Array(items) => {
                let ids: Vec<NodeId> = items.iter().map(|item| self.insert_json(item)).collect();
                self.sequence(ids)
            }
            Value::Object(map) => {
                let entries: Vec<(String, NodeId)> =
                    map.iter().map(|(k, v)| (k.clone(), self.insert_json(v))).collect();
                self.mapping(entries)
            }
        }
    }

    /// Render the sub-tree at `id` as JSON. Aliased nodes are written out at every
    /// place they are referenced; a reference back into its own ancestors (a YAML
    /// self-alias) is written as `null`.
    pub fn to_json(&self, id: NodeId) -> serde_json::Value {
        self.to_json_inner(id, &mut Vec::new())
    }

    fn to_json_inner(&self, id: NodeId, ancestors: &mut Vec<NodeId>) -> serde_json::Value {
        if ancestors.contains(&id) {
            return serde_json::Value::Null;
        }

        let node = self.node(id);
        if let Node::Scalar(scalar) = node {
            return scalar.to_json();
        }

        ancestors.push(id);
        let value = match node {
            Node::Sequence(items) => serde_json::Value::Array(
                items.iter().map(|item| self.to_json_inner(*item, ancestors)).collect(),
            ),
            Node::Mapping(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.to_json_inner(*v, ancestors)))
                    .collect(),
            ),
            Node::Scalar(_) => serde_json::Value::Null,
        };
        ancestors.pop();
        value
    }

    /// Render the whole document as JSON.
    pub fn root_json(&self) -> serde_json::Value {
        self.to_json(self.root)
    }

    /// Borrow the mapping entries of a node, if it is a mapping.
    pub fn as_mapping(&self, id: NodeId) -> Option<&IndexMap<String, NodeId>> {
        match self.node(id) {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrow the scalar of a node, if it is a scalar.
    pub fn as_scalar(&self, id: NodeId) -> Option<&Scalar> {
        match self.node(id) {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

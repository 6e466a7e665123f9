//! Configuration-driven object graph construction.
//!
//! [`ObjectBuilder`] walks a [`ValueGraph`] bottom-up. A mapping with exactly one key
//! that the [`Resolver`] accepts as a marker is replaced by the result of the
//! matching constructor, called with its already-built arguments. Everything else is
//! copied as plain data.
//!
//! Every mapping built during one [`create`](ObjectBuilder::create) call is recorded
//! by [`NodeId`]. Reaching the same node again returns the recorded value, so a YAML
//! alias yields the very same instance at every place it is used while two
//! identical-looking sub-trees still yield two instances.
//!
//! # Examples
//!
//! ```rust
//! use useful::creator::{Arguments, ObjectBuilder, TypeRegistry};
//! use useful::value::ValueGraph;
//!
//! struct Widget {
//!     size: i64,
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register("pkg.Widget", |args: Arguments| Ok(Widget { size: args.i64("size")? }));
//!
//! let mut graph = ValueGraph::new();
//! let size = graph.scalar(3);
//! let args = graph.mapping([("size", size)]);
//! let widget = graph.mapping([("pkg.Widget", args)]);
//! let root = graph.mapping([("a", widget), ("b", widget)]);
//! graph.set_root(root);
//!
//! let built = ObjectBuilder::new(&registry).create(&graph, graph.root()).unwrap();
//! let a = built.get("a").unwrap().as_instance().unwrap();
//! let b = built.get("b").unwrap().as_instance().unwrap();
//! assert!(a.ptr_eq(b));
//! assert_eq!(a.downcast_ref::<Widget>().unwrap().size, 3);
//! ```

use super::built::{Arguments, BuiltValue};
use super::resolver::{Resolver, split_type_path};
use crate::core::UsefulError;
use crate::value::{Node, NodeId, ValueGraph};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Build the whole graph starting at its root.
pub fn create(graph: &ValueGraph, resolver: &dyn Resolver) -> Result<BuiltValue, UsefulError> {
    ObjectBuilder::new(resolver).create(graph, graph.root())
}

/// Builds object graphs with a fixed resolver.
///
/// The builder itself is stateless between calls; each [`create`](Self::create) has
/// its own identity table.
#[derive(Clone, Copy)]
pub struct ObjectBuilder<'r> {
    resolver: &'r dyn Resolver,
}

impl<'r> ObjectBuilder<'r> {
    /// Create a builder using `resolver` for marker detection and lookup.
    pub fn new(resolver: &'r dyn Resolver) -> Self {
        Self { resolver }
    }

    /// Build the sub-tree rooted at `id`.
    ///
    /// # Errors
    ///
    /// - [`UsefulError::UnresolvedType`] when a marker key has no constructor
    /// - [`UsefulError::Construction`] when a constructor fails
    /// - [`UsefulError::CyclicReference`] when an alias points into its own ancestors
    pub fn create(&self, graph: &ValueGraph, id: NodeId) -> Result<BuiltValue, UsefulError> {
        let mut walk = Walk {
            graph,
            resolver: self.resolver,
            built: HashMap::new(),
            in_progress: HashSet::new(),
            constructed: 0,
            reused: 0,
        };
        let value = walk.build(id)?;
        debug!(
            constructed = walk.constructed,
            reused = walk.reused,
            "Object graph built"
        );
        Ok(value)
    }
}

struct Walk<'a> {
    graph: &'a ValueGraph,
    resolver: &'a dyn Resolver,
    built: HashMap<NodeId, BuiltValue>,
    in_progress: HashSet<NodeId>,
    constructed: usize,
    reused: usize,
}

impl Walk<'_> {
    fn build(&mut self, id: NodeId) -> Result<BuiltValue, UsefulError> {
        let graph = self.graph;
        match graph.node(id) {
            Node::Scalar(scalar) => Ok(BuiltValue::Scalar(scalar.clone())),
            Node::Sequence(items) => {
                self.enter(id)?;
                let result: Result<Vec<_>, _> = items.iter().map(|item| self.build(*item)).collect();
                self.in_progress.remove(&id);
                result.map(BuiltValue::Sequence)
            }
            Node::Mapping(entries) => {
                if let Some(hit) = self.built.get(&id) {
                    self.reused += 1;
                    debug!(node = %id, "Reusing already built node");
                    return Ok(hit.clone());
                }

                self.enter(id)?;
                let result = match self.marker(entries) {
                    Some((key, params)) => self.construct(key, params),
                    None => self.build_plain(entries),
                };
                self.in_progress.remove(&id);

                let value = result?;
                self.built.insert(id, value.clone());
                Ok(value)
            }
        }
    }

    fn enter(&mut self, id: NodeId) -> Result<(), UsefulError> {
        if self.in_progress.insert(id) {
            Ok(())
        } else {
            Err(UsefulError::CyclicReference { node: id.index() })
        }
    }

    fn marker<'g>(&self, entries: &'g IndexMap<String, NodeId>) -> Option<(&'g str, NodeId)> {
        if entries.len() != 1 {
            return None;
        }
        let (key, params) = entries.first()?;
        self.resolver.is_marker(key).then_some((key.as_str(), *params))
    }

    fn construct(&mut self, type_path: &str, params: NodeId) -> Result<BuiltValue, UsefulError> {
        let constructor = self.resolver.resolve(type_path)?;
        let params = self.build(params)?;
        let arguments = Arguments::from_params(type_path, params);

        let (module, name) = split_type_path(type_path);
        debug!(module, name, arguments = arguments.len(), "Constructing instance");

        let value = constructor(arguments).map_err(|e| UsefulError::construction(type_path, e))?;
        self.constructed += 1;
        Ok(value)
    }

    fn build_plain(&mut self, entries: &IndexMap<String, NodeId>) -> Result<BuiltValue, UsefulError> {
        let mut built = IndexMap::with_capacity(entries.len());
        for (key, child) in entries {
            built.insert(key.clone(), self.build(*child)?);
        }
        Ok(BuiltValue::Mapping(built))
    }
}

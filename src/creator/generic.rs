//! The generic construction marker.
//!
//! Besides the shorthand `{ "pkg.Widget": {...} }`, a configuration may spell a
//! construction as
//!
//! ```yaml
//! class:
//!   module: pkg
//!   name: Widget
//! params:
//!   size: 3
//! ```
//!
//! [`GenericMarkers::normalize`] rewrites such mappings in place into the shorthand
//! form before building. The rewrite keeps the node id, so aliases of a generic
//! marker still share one instance.
//!
//! Normalization is opt-in: [`ConfigLoader`](crate::config::ConfigLoader) only runs
//! it after [`with_generic_markers`](crate::config::ConfigLoader::with_generic_markers).

use crate::value::{Node, NodeId, Scalar, ValueGraph};
use indexmap::IndexMap;
use tracing::debug;

/// Key names of the generic marker form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericMarkers {
    /// Key holding `{module, name}`
    pub class_key: String,
    /// Key holding the constructor arguments
    pub params_key: String,
}

impl Default for GenericMarkers {
    fn default() -> Self {
        Self {
            class_key: "class".to_string(),
            params_key: "params".to_string(),
        }
    }
}

impl GenericMarkers {
    /// Rewrite every generic marker in `graph` and return how many were rewritten.
    ///
    /// A mapping qualifies when it has the class key, no keys other than the class
    /// and params keys, and its class value is a mapping holding a string `name`, an
    /// optional string `module` and nothing else. A missing `module` or an empty one
    /// yields a bare type name. A missing params key means no arguments.
    pub fn normalize(&self, graph: &mut ValueGraph) -> usize {
        let mut rewrites: Vec<(NodeId, String, Option<NodeId>)> = Vec::new();

        for id in graph.ids() {
            let Some(entries) = graph.as_mapping(id) else {
                continue;
            };
            if let Some((type_path, params)) = self.match_generic(graph, entries) {
                rewrites.push((id, type_path, params));
            }
        }

        let count = rewrites.len();
        for (id, type_path, params) in rewrites {
            let params = params.unwrap_or_else(|| graph.scalar(Scalar::Null));
            debug!(node = %id, type_path = %type_path, "Normalized generic marker");
            graph.replace(id, Node::Mapping(IndexMap::from([(type_path, params)])));
        }
        count
    }

    fn match_generic(
        &self,
        graph: &ValueGraph,
        entries: &IndexMap<String, NodeId>,
    ) -> Option<(String, Option<NodeId>)> {
        let class = *entries.get(&self.class_key)?;
        if entries.keys().any(|k| *k != self.class_key && *k != self.params_key) {
            return None;
        }

        let class = graph.as_mapping(class)?;
        if class.keys().any(|k| k != "name" && k != "module") {
            return None;
        }
        let name = graph.as_scalar(*class.get("name")?)?.as_str()?;
        let module = match class.get("module") {
            Some(id) => graph.as_scalar(*id)?.as_str()?,
            None => "",
        };

        let type_path = if module.is_empty() {
            name.to_string()
        } else {
            format!("{module}.{name}")
        };
        Some((type_path, entries.get(&self.params_key).copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::{Arguments, TypeRegistry, create};
    use serde_json::json;

    #[test]
    fn test_normalize_rewrites_generic_marker() {
        let mut graph = ValueGraph::from_json(&json!({
            "svc": {"class": {"module": "pkg", "name": "Widget"}, "params": {"size": 2}},
            "plain": {"class": "not a marker", "params": 1},
        }));

        assert_eq!(GenericMarkers::default().normalize(&mut graph), 1);
        assert_eq!(
            graph.root_json(),
            json!({
                "svc": {"pkg.Widget": {"size": 2}},
                "plain": {"class": "not a marker", "params": 1},
            })
        );
    }

    #[test]
    fn test_extra_keys_are_left_alone() {
        let value = json!({"class": {"module": "pkg", "name": "Widget"}, "other": 1});
        let mut graph = ValueGraph::from_json(&value);
        assert_eq!(GenericMarkers::default().normalize(&mut graph), 0);
        assert_eq!(graph.root_json(), value);
    }

    #[test]
    fn test_class_with_other_fields_is_plain_data() {
        let value = json!({
            "student": {"class": {"name": "Math", "room": 5}},
            "course": {"class": {"name": "Art", "module": 3}},
        });
        let mut graph = ValueGraph::from_json(&value);
        assert_eq!(GenericMarkers::default().normalize(&mut graph), 0);
        assert_eq!(graph.root_json(), value);
    }

    #[test]
    fn test_generic_marker_builds() {
        let mut registry = TypeRegistry::new();
        registry.register("Widget", |args: Arguments| Ok(args.is_empty()));

        let mut graph = ValueGraph::from_json(&json!({"class": {"name": "Widget"}}));
        GenericMarkers::default().normalize(&mut graph);

        let built = create(&graph, &registry).unwrap();
        assert!(*built.downcast::<bool>().unwrap());
    }
}

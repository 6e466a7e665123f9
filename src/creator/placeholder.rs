//! `<name>` placeholders in built values.
//!
//! A string scalar that is exactly `<identifier>` is a placeholder. The builder leaves
//! placeholders alone; [`inject`] replaces them after the fact with values that only
//! exist at runtime (a database handle, a port picked by the host).

use super::built::BuiltValue;
use crate::value::Scalar;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z_][A-Za-z0-9_]*)>$").expect("placeholder pattern is valid")
});

/// Name inside a placeholder string, or `None` if `text` is not a placeholder.
///
/// ```rust
/// use useful::creator::placeholder_name;
///
/// assert_eq!(placeholder_name("<db>"), Some("db"));
/// assert_eq!(placeholder_name("<not valid>"), None);
/// ```
pub fn placeholder_name(text: &str) -> Option<&str> {
    PLACEHOLDER
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Replace every placeholder with a known substitution, in place.
///
/// Walks mappings and sequences, including those returned by constructors. Instances
/// are opaque. Placeholders without a substitution stay as they are. Returns the
/// number of replacements.
pub fn inject(value: &mut BuiltValue, substitutions: &HashMap<String, BuiltValue>) -> usize {
    match value {
        BuiltValue::Scalar(Scalar::String(text)) => {
            let replacement = placeholder_name(text).and_then(|name| substitutions.get(name));
            match replacement {
                Some(replacement) => {
                    debug!(placeholder = %text, "Injecting placeholder");
                    *value = replacement.clone();
                    1
                }
                None => 0,
            }
        }
        BuiltValue::Sequence(items) => items.iter_mut().map(|item| inject(item, substitutions)).sum(),
        BuiltValue::Mapping(entries) => entries
            .values_mut()
            .map(|item| inject(item, substitutions))
            .sum(),
        BuiltValue::Scalar(_) | BuiltValue::Instance(_) => 0,
    }
}

/// Names of all placeholders still present in `value`, in traversal order.
pub fn find_placeholders(value: &BuiltValue) -> Vec<String> {
    let mut names = Vec::new();
    collect(value, &mut names);
    names
}

fn collect(value: &BuiltValue, names: &mut Vec<String>) {
    match value {
        BuiltValue::Scalar(Scalar::String(text)) => {
            if let Some(name) = placeholder_name(text) {
                names.push(name.to_string());
            }
        }
        BuiltValue::Sequence(items) => items.iter().for_each(|item| collect(item, names)),
        BuiltValue::Mapping(entries) => entries.values().for_each(|item| collect(item, names)),
        BuiltValue::Scalar(_) | BuiltValue::Instance(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::{TypeRegistry, create};
    use crate::value::ValueGraph;
    use serde_json::json;

    fn built(value: serde_json::Value) -> BuiltValue {
        create(&ValueGraph::from_json(&value), &TypeRegistry::new()).unwrap()
    }

    #[test]
    fn test_unresolved_placeholders_pass_through() {
        let mut value = built(json!({"db": "<db>", "port": "<port>", "name": "svc"}));
        let substitutions = HashMap::from([("port".to_string(), BuiltValue::from(8080))]);

        assert_eq!(inject(&mut value, &substitutions), 1);
        assert_eq!(value.to_json(), json!({"db": "<db>", "port": 8080, "name": "svc"}));
        assert_eq!(find_placeholders(&value), ["db"]);
    }

    #[test]
    fn test_inject_into_nested_sequences() {
        let mut value = built(json!({"hosts": ["<primary>", "static", ["<primary>"]]}));
        let substitutions = HashMap::from([("primary".to_string(), BuiltValue::from("db1"))]);

        assert_eq!(inject(&mut value, &substitutions), 2);
        assert_eq!(value.to_json(), json!({"hosts": ["db1", "static", ["db1"]]}));
    }

    #[test]
    fn test_instance_substitution_keeps_identity() {
        let shared = BuiltValue::instance("pkg.Conn", 7_u8);
        let mut value = built(json!(["<conn>", "<conn>"]));
        let substitutions = HashMap::from([("conn".to_string(), shared.clone())]);

        inject(&mut value, &substitutions);
        let items = value.as_sequence().unwrap();
        assert_eq!(items[0], shared);
        assert_eq!(items[1], shared);
    }

    #[test]
    fn test_non_placeholder_strings() {
        assert_eq!(placeholder_name("<a b>"), None);
        assert_eq!(placeholder_name("x<a>"), None);
        assert_eq!(placeholder_name("<1a>"), None);
        assert_eq!(placeholder_name("<_a1>"), Some("_a1"));
    }
}

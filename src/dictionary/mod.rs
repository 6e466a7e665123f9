//! Flattening nested documents into single-level mappings and back.
//!
//! ```rust
//! use serde_json::json;
//! use useful::dictionary::{from_mapping, to_mapping};
//!
//! let nested = json!({"db": {"hosts": ["a", "b"], "port": 5432}});
//! let flat = to_mapping(&nested, ".");
//! assert_eq!(
//!     serde_json::Value::Object(flat.clone()),
//!     json!({"db.hosts.0": "a", "db.hosts.1": "b", "db.port": 5432})
//! );
//! assert_eq!(from_mapping(&flat, "."), nested);
//! ```
//!
//! Scalars flatten to `{"": value}`. Empty objects and arrays have no leaves and
//! disappear when flattened.

use serde_json::{Map, Value};
use tracing::debug;

/// Separator used by the CLI when none is given.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Flatten `value` into a single-level mapping whose keys join the path with
/// `separator`. Array indices become decimal keys.
pub fn to_mapping(value: &Value, separator: &str) -> Map<String, Value> {
    let mut mapping = Map::new();
    match value {
        Value::Object(entries) => {
            for (key, child) in entries {
                prefix_into(&mut mapping, key, to_mapping(child, separator), separator);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                prefix_into(&mut mapping, &index.to_string(), to_mapping(child, separator), separator);
            }
        }
        leaf => {
            mapping.insert(String::new(), leaf.clone());
        }
    }
    mapping
}

fn prefix_into(target: &mut Map<String, Value>, prefix: &str, child: Map<String, Value>, separator: &str) {
    for (key, value) in child {
        let joined = [prefix, key.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(separator);
        target.insert(joined, value);
    }
}

/// Rebuild a nested document from a mapping produced by [`to_mapping`].
///
/// Objects whose keys are exactly `"0"` to `"n-1"` become arrays, and an object whose
/// only key is `""` collapses to its value. When two keys disagree about the shape at
/// one path, the later key wins.
pub fn from_mapping(mapping: &Map<String, Value>, separator: &str) -> Value {
    let mut root = Value::Object(Map::new());
    for (key, value) in mapping {
        let parts: Vec<&str> = if separator.is_empty() {
            vec![key.as_str()]
        } else {
            key.split(separator).collect()
        };
        insert_path(&mut root, &parts, value.clone());
    }

    let root = into_lists(root);
    match root {
        Value::Object(mut entries) if entries.len() == 1 && entries.contains_key("") => {
            entries.remove("").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn insert_path(target: &mut Value, parts: &[&str], value: Value) {
    let Some((first, rest)) = parts.split_first() else {
        *target = value;
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(entries) = target {
        let child = entries
            .entry((*first).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if rest.is_empty() {
            *child = value;
        } else {
            insert_path(child, rest, value);
        }
    }
}

fn into_lists(value: Value) -> Value {
    let Value::Object(entries) = value else {
        return value;
    };

    let entries: Map<String, Value> = entries.into_iter().map(|(k, v)| (k, into_lists(v))).collect();
    let is_list = !entries.is_empty() && (0..entries.len()).all(|i| entries.contains_key(&i.to_string()));
    if !is_list {
        return Value::Object(entries);
    }

    let mut entries = entries;
    let items = (0..entries.len())
        .map(|i| entries.remove(&i.to_string()).unwrap_or(Value::Null))
        .collect();
    Value::Array(items)
}

/// Copy of `dictionary` without `null` values.
pub fn clean_dict(dictionary: &Map<String, Value>) -> Map<String, Value> {
    debug!("Cleaning the dictionary");
    dictionary
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

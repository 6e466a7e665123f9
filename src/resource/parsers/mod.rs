//! Parsers turning downloaded bytes into a [`ValueGraph`], keyed by mimetype.
//!
//! | Mimetype             | Result                                   |
//! |----------------------|------------------------------------------|
//! | `application/json`   | the JSON document                        |
//! | `application/yaml`   | the first YAML document, aliases shared  |
//! | `text/csv`           | a sequence of rows of string cells       |
//! | `text/plain`         | a single string scalar                   |
//! | `application/pickle` | the unpickled value                      |
//! | anything else        | a single bytes scalar                    |

mod yaml;

pub use yaml::{parse_yaml, parse_yaml_str};

use super::mimetypes;
use crate::value::{Scalar, ValueGraph};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A parser function.
pub type Parser = Arc<dyn Fn(&[u8]) -> Result<ValueGraph> + Send + Sync>;

/// Parser registry keyed by lower-cased mimetype.
#[derive(Clone)]
pub struct Parsers {
    parsers: HashMap<String, Parser>,
}

impl Default for Parsers {
    fn default() -> Self {
        let mut parsers = Self::empty();
        parsers.add(mimetypes::JSON, parse_json);
        parsers.add(mimetypes::YAML, parse_yaml);
        parsers.add(mimetypes::CSV, parse_csv);
        parsers.add(mimetypes::TEXT, parse_text);
        parsers.add(mimetypes::PICKLE, parse_pickle);
        parsers
    }
}

impl fmt::Debug for Parsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mimetypes: Vec<&String> = self.parsers.keys().collect();
        mimetypes.sort_unstable();
        f.debug_struct("Parsers").field("mimetypes", &mimetypes).finish()
    }
}

impl Parsers {
    /// A registry with no parsers; everything parses to raw bytes.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register `parser` for `mimetype`, replacing any previous one.
    pub fn add<F>(&mut self, mimetype: &str, parser: F)
    where
        F: Fn(&[u8]) -> Result<ValueGraph> + Send + Sync + 'static,
    {
        self.parsers.insert(mimetype.to_ascii_lowercase(), Arc::new(parser));
    }

    /// Remove the parser for `mimetype`, returning whether one was registered.
    pub fn remove(&mut self, mimetype: &str) -> bool {
        self.parsers.remove(&mimetype.to_ascii_lowercase()).is_some()
    }

    /// Parser for `mimetype`, if any.
    pub fn get(&self, mimetype: &str) -> Option<&Parser> {
        self.parsers.get(&mimetype.to_ascii_lowercase())
    }

    /// Parse `bytes` as `mimetype`; unknown or absent types yield a bytes scalar.
    pub fn parse(&self, mimetype: Option<&str>, bytes: &[u8]) -> Result<ValueGraph> {
        match mimetype.and_then(|mimetype| self.get(mimetype)) {
            Some(parser) => parser(bytes),
            None => Ok(parse_bytes(bytes)),
        }
    }
}

/// Parse a JSON document.
pub fn parse_json(bytes: &[u8]) -> Result<ValueGraph> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(ValueGraph::from_json(&value))
}

/// Parse CSV into a sequence of rows, each a sequence of string cells.
///
/// Rows may differ in length; no header row is assumed.
pub fn parse_csv(bytes: &[u8]) -> Result<ValueGraph> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut graph = ValueGraph::new();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("invalid CSV record {}", index + 1))?;
        let cells: Vec<_> = record.iter().map(|cell| graph.scalar(cell)).collect();
        rows.push(graph.sequence(cells));
    }
    let root = graph.sequence(rows);
    graph.set_root(root);
    Ok(graph)
}

/// Parse UTF-8 text into a single string scalar.
pub fn parse_text(bytes: &[u8]) -> Result<ValueGraph> {
    let text = std::str::from_utf8(bytes).context("text resource is not valid UTF-8")?;
    Ok(ValueGraph::from_scalar(text))
}

/// Unpickle a value. Only data that maps onto JSON-like values is supported.
pub fn parse_pickle(bytes: &[u8]) -> Result<ValueGraph> {
    let value: serde_json::Value = serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new())?;
    Ok(ValueGraph::from_json(&value))
}

/// Wrap raw bytes in a single scalar.
pub fn parse_bytes(bytes: &[u8]) -> ValueGraph {
    ValueGraph::from_scalar(Scalar::Bytes(bytes.to_vec()))
}

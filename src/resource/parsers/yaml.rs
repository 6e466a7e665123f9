//! YAML parsing that keeps anchors and aliases.
//!
//! The document is consumed as a stream of parser events instead of being loaded
//! into an owned tree. Every anchored node is remembered by its anchor id and every
//! alias resolves to that same [`NodeId`], so aliased sub-trees stay shared in the
//! resulting [`ValueGraph`].
//!
//! Container nodes are allocated when they start, which makes an alias to an
//! enclosing anchor (`&a [*a]`) a real cycle in the graph. The object builder
//! rejects such cycles.
//!
//! Merge keys are resolved when their mapping ends: `<<: *base` copies the entries
//! of `base`, and `<<: [*a, *b]` copies from each mapping with earlier ones taking
//! precedence. Keys written in the mapping itself always win. The merged entries
//! point at the same nodes as the source, so nested values stay shared.

use crate::value::{Node, NodeId, Scalar, ValueGraph};
use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

const MERGE_KEY: &str = "<<";

/// Parse the first YAML document in `bytes`. An empty stream yields `null`.
pub fn parse_yaml(bytes: &[u8]) -> Result<ValueGraph> {
    let text = std::str::from_utf8(bytes).map_err(|e| anyhow!("invalid UTF-8: {e}"))?;
    parse_yaml_str(text)
}

/// Parse the first YAML document in `text`.
pub fn parse_yaml_str(text: &str) -> Result<ValueGraph> {
    let mut receiver = GraphReceiver::default();
    let mut parser = Parser::new_from_str(text);
    parser.load(&mut receiver, false).map_err(|e| anyhow!("{e}"))?;

    if let Some(error) = receiver.error {
        return Err(anyhow!(error));
    }

    let mut graph = receiver.graph;
    if let Some(root) = receiver.root {
        graph.set_root(root);
    }
    Ok(graph)
}

enum Frame {
    Sequence {
        id: NodeId,
        items: Vec<NodeId>,
    },
    Mapping {
        id: NodeId,
        entries: IndexMap<String, NodeId>,
        key: Option<String>,
        merging: bool,
        merges: Vec<NodeId>,
    },
}

#[derive(Default)]
struct GraphReceiver {
    graph: ValueGraph,
    anchors: HashMap<usize, NodeId>,
    stack: Vec<Frame>,
    root: Option<NodeId>,
    error: Option<String>,
}

impl GraphReceiver {
    fn expects_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { key: None, .. }))
    }

    fn remember(&mut self, anchor: usize, id: NodeId) {
        if anchor > 0 {
            self.anchors.insert(anchor, id);
        }
    }

    fn attach(&mut self, id: NodeId) {
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(id),
            Some(Frame::Mapping {
                entries,
                key,
                merging,
                merges,
                ..
            }) => {
                if std::mem::take(merging) {
                    key.take();
                    merges.push(id);
                } else if let Some(key) = key.take() {
                    entries.insert(key, id);
                }
            }
            None => {
                if self.root.is_none() {
                    self.root = Some(id);
                }
            }
        }
    }

    fn fail(&mut self, message: &str, mark: Marker) {
        if self.error.is_none() {
            self.error = Some(format!(
                "{message} at line {} column {}",
                mark.line(),
                mark.col() + 1
            ));
        }
    }

    fn on_scalar(&mut self, value: String, style: TScalarStyle, anchor: usize, tag: Option<Tag>) {
        let scalar = resolve_scalar(value, style, tag.as_ref());

        if self.expects_key() {
            if let Some(Frame::Mapping { key, merging, .. }) = self.stack.last_mut() {
                *merging = style == TScalarStyle::Plain && tag.is_none() && scalar.as_str() == Some(MERGE_KEY);
                *key = Some(match scalar {
                    Scalar::String(s) => s,
                    other => other.to_string(),
                });
            }
            return;
        }

        let id = self.graph.scalar(scalar);
        self.remember(anchor, id);
        self.attach(id);
    }

    /// Entries of a mapping after applying its merge sources.
    fn merged(
        &self,
        entries: IndexMap<String, NodeId>,
        merges: &[NodeId],
    ) -> std::result::Result<IndexMap<String, NodeId>, &'static str> {
        if merges.is_empty() {
            return Ok(entries);
        }

        let mut sources = Vec::new();
        for &merge in merges {
            match self.graph.node(merge) {
                Node::Sequence(items) => sources.extend(items.iter().copied()),
                _ => sources.push(merge),
            }
        }

        let mut result = IndexMap::new();
        for source in sources {
            if self.is_open(source) {
                return Err("merge of an enclosing mapping");
            }
            let Some(source) = self.graph.as_mapping(source) else {
                return Err("merge value must be a mapping or a sequence of mappings");
            };
            for (key, value) in source {
                result.entry(key.clone()).or_insert(*value);
            }
        }
        for (key, value) in entries {
            result.insert(key, value);
        }
        Ok(result)
    }

    fn is_open(&self, id: NodeId) -> bool {
        self.stack.iter().any(|frame| match frame {
            Frame::Sequence { id: open, .. } | Frame::Mapping { id: open, .. } => *open == id,
        })
    }
}

impl MarkedEventReceiver for GraphReceiver {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }

        match event {
            Event::Scalar(value, style, anchor, tag) => self.on_scalar(value, style, anchor, tag),
            Event::Alias(anchor) => {
                if self.expects_key() {
                    self.fail("aliases are not supported as mapping keys", mark);
                    return;
                }
                match self.anchors.get(&anchor).copied() {
                    Some(id) => self.attach(id),
                    None => self.fail("unknown anchor", mark),
                }
            }
            Event::SequenceStart(anchor, _) => {
                if self.expects_key() {
                    self.fail("sequences are not supported as mapping keys", mark);
                    return;
                }
                let id = self.graph.push(Node::Sequence(Vec::new()));
                self.remember(anchor, id);
                self.stack.push(Frame::Sequence {
                    id,
                    items: Vec::new(),
                });
            }
            Event::MappingStart(anchor, _) => {
                if self.expects_key() {
                    self.fail("mappings are not supported as mapping keys", mark);
                    return;
                }
                let id = self.graph.push(Node::Mapping(IndexMap::new()));
                self.remember(anchor, id);
                self.stack.push(Frame::Mapping {
                    id,
                    entries: IndexMap::new(),
                    key: None,
                    merging: false,
                    merges: Vec::new(),
                });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let (id, node) = match self.stack.pop() {
                    Some(Frame::Sequence { id, items }) => (id, Node::Sequence(items)),
                    Some(Frame::Mapping {
                        id, entries, merges, ..
                    }) => match self.merged(entries, &merges) {
                        Ok(entries) => (id, Node::Mapping(entries)),
                        Err(message) => {
                            self.fail(message, mark);
                            return;
                        }
                    },
                    None => return,
                };
                self.graph.replace(id, node);
                self.attach(id);
            }
            _ => {}
        }
    }
}

fn resolve_scalar(value: String, style: TScalarStyle, tag: Option<&Tag>) -> Scalar {
    match tag {
        Some(tag) if tag.handle == "!!" || tag.handle == "tag:yaml.org,2002:" => {
            match tag.suffix.as_str() {
                "str" | "binary" => Scalar::String(value),
                _ => Scalar::resolve_plain(&value),
            }
        }
        Some(_) => Scalar::String(value),
        None if style == TScalarStyle::Plain => Scalar::resolve_plain(&value),
        None => Scalar::String(value),
    }
}

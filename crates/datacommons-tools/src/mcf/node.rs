//! MCF node blocks and node collections.

use indexmap::IndexMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::sanitize::sanitize_field;

use super::quoting::{is_quoted_property, unquote};

/// One `Node: <id>` block of an MCF file.
///
/// Property values are stored the way they appear in the file, so a quoted
/// value keeps its quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McfNode {
    node: String,
    properties: IndexMap<String, String>,
}

impl McfNode {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.node
    }

    pub(crate) fn set_id(&mut self, id: impl Into<String>) {
        self.node = id.into();
    }

    /// Sets a property. A `Node` key changes the node id instead.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if key == "Node" {
            self.node = value.into();
        } else {
            self.properties.insert(key, value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.properties.shift_remove(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn type_of(&self) -> Option<&str> {
        self.get("typeOf")
    }

    /// The provenance name this node cites, without quotes.
    pub fn provenance(&self) -> Option<&str> {
        self.get("provenance").map(unquote)
    }

    /// Renders the block: `Node` first, then `name` and `typeOf`, then every
    /// other property sorted by key. Each value is sanitised and quoted text
    /// properties are quoted exactly once.
    pub fn to_mcf(&self) -> String {
        let mut lines = vec![format!("Node: {}", sanitize_field(&self.node))];

        let mut rest: Vec<(&String, &String)> = self
            .properties
            .iter()
            .filter(|(k, _)| k.as_str() != "name" && k.as_str() != "typeOf")
            .collect();
        rest.sort_by(|a, b| a.0.cmp(b.0));

        let leading = ["name", "typeOf"]
            .into_iter()
            .filter_map(|k| self.properties.get_key_value(k));

        for (key, value) in leading.chain(rest) {
            lines.push(format!("{}: {}", key, render_value(key, value)));
        }

        lines.join("\n") + "\n"
    }
}

fn render_value(key: &str, value: &str) -> String {
    let value = sanitize_field(value);
    if is_quoted_property(key) && !value.starts_with('"') {
        format!("\"{}\"", unquote(&value))
    } else {
        value
    }
}

/// An ordered collection of MCF nodes keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McfNodes {
    nodes: IndexMap<String, McfNode>,
}

impl McfNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses MCF text. Blocks are separated by blank lines and each line is
    /// `key: value`, split at the first colon.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut nodes = Self::new();
        let mut block: Vec<(String, String)> = Vec::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                nodes.flush(&mut block)?;
                continue;
            }
            if line.starts_with("//") || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(invalid_line(index, raw_line));
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(invalid_line(index, raw_line));
            }
            block.push((key.to_string(), value.to_string()));
        }

        nodes.flush(&mut block)?;
        Ok(nodes)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    fn flush(&mut self, block: &mut Vec<(String, String)>) -> Result<(), ConfigError> {
        if block.is_empty() {
            return Ok(());
        }

        let Some(id) = block
            .iter()
            .find(|(k, _)| k == "Node")
            .map(|(_, v)| v.clone())
        else {
            let (k, v) = &block[0];
            return Err(ConfigError::MissingNodeLine {
                first: format!("{}: {}", k, v),
            });
        };

        let mut node = McfNode::new(id);
        for (key, value) in block.drain(..) {
            if key != "Node" {
                node.set(key, value);
            }
        }
        self.nodes.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Adds a node. Returns false and leaves the collection untouched when a
    /// node with the same id exists and `overwrite` is not set.
    pub fn insert(&mut self, node: McfNode, overwrite: bool) -> bool {
        if self.nodes.contains_key(node.id()) && !overwrite {
            return false;
        }
        self.nodes.insert(node.id().to_string(), node);
        true
    }

    pub fn get(&self, id: &str) -> Option<&McfNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<McfNode> {
        self.nodes.shift_remove(id)
    }

    /// Renames a node in place and rewrites `memberOf` / `specializationOf`
    /// references to it, with or without the `dcid:` prefix.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.nodes.get_index_of(old) else {
            return false;
        };
        let Some(mut node) = self.nodes.shift_remove(old) else {
            return false;
        };
        node.set_id(new);
        self.nodes.shift_insert(index, new.to_string(), node);

        let old_ref = format!("dcid:{}", old.trim_start_matches("dcid:"));
        let new_ref = format!("dcid:{}", new.trim_start_matches("dcid:"));
        for node in self.nodes.values_mut() {
            for key in ["memberOf", "specializationOf"] {
                if let Some(value) = node.properties.get_mut(key) {
                    *value = value
                        .split(',')
                        .map(str::trim)
                        .map(|item| {
                            if item == old {
                                new.to_string()
                            } else if item == old_ref {
                                new_ref.clone()
                            } else {
                                item.to_string()
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                }
            }
        }
        true
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut McfNode> {
        self.nodes.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &McfNode> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Renders every node, blocks separated by a blank line.
    pub fn to_mcf(&self) -> String {
        self.nodes
            .values()
            .map(|node| node.to_mcf() + "\n")
            .collect()
    }
}

fn invalid_line(index: usize, raw_line: &str) -> ConfigError {
    ConfigError::InvalidMcf {
        line: index + 1,
        content: raw_line.to_string(),
    }
}

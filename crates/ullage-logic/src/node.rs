//! Persisted configuration nodes.
//!
//! A node is a name, an ordered list of string key/value pairs and an ordered
//! list of child nodes. Values are stored as text; numeric helpers write
//! `f64` in Rust's shortest round-trip form so a parse gives back the exact
//! same bits.

use serde::{Deserialize, Serialize};

/// A named key/value node with children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    pub name: String,
    pub values: Vec<(String, String)>,
    pub nodes: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// First value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Set `key`, replacing an existing entry in place or appending.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
    }

    /// Store an `f64` at full round-trip precision.
    pub fn set_f64(&mut self, key: impl Into<String>, value: f64) {
        self.set_value(key, format!("{value:?}"));
    }

    /// Parse `key` as `f64`. Missing or malformed values read as `None`.
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|v| v.trim().parse().ok())
    }

    /// First child node called `name`.
    pub fn node(&self, name: &str) -> Option<&ConfigNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    pub fn add_node(&mut self, node: ConfigNode) {
        self.nodes.push(node);
    }

    /// Remove every child called `name`.
    pub fn remove_nodes(&mut self, name: &str) {
        self.nodes.retain(|n| n.name != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_replaces() {
        let mut node = ConfigNode::new("ENGINE");
        node.set_value("a", "1");
        node.set_value("b", "2");
        node.set_value("a", "3");
        assert_eq!(node.values.len(), 2);
        assert_eq!(node.value("a"), Some("3"));
    }

    #[test]
    fn test_f64_exact() {
        let mut node = ConfigNode::new("X");
        let v = 0.1 + 0.2;
        node.set_f64("v", v);
        assert_eq!(node.f64("v").map(f64::to_bits), Some(v.to_bits()));
    }

    #[test]
    fn test_f64_malformed() {
        let mut node = ConfigNode::new("X");
        node.set_value("v", "not a number");
        assert_eq!(node.f64("v"), None);
        assert_eq!(node.f64("missing"), None);
    }

    #[test]
    fn test_children() {
        let mut node = ConfigNode::new("ENGINE");
        node.add_node(ConfigNode::new("Ullage"));
        assert!(node.has_node("Ullage"));
        node.remove_nodes("Ullage");
        assert!(!node.has_node("Ullage"));
    }
}

//! Owned spanned value tree shared by the JSON and YAML decoders.
//!
//! Both decoders lower their native syntax trees into [`Node`], which pairs
//! every value with the [`LocationRange`] of the tokens that produced it in
//! the original source text. The locator walk and the decoded-data
//! evaluation both operate on this one representation, so positions and
//! values can never disagree about the document's shape.

use serde_json::Value;

use super::LocationRange;

/// A decoded value annotated with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The value carried by this node.
    pub kind: NodeKind,
    /// Span of the tokens that produced this value, from the first
    /// character of the value to one past its last character.
    pub span: LocationRange,
}

/// The value alternatives a [`Node`] can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A `null` value.
    Null,
    /// A boolean scalar.
    Bool(bool),
    /// A numeric scalar.
    Number(serde_json::Number),
    /// A string scalar.
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Node>),
    /// An ordered list of key/value members, duplicates included.
    Object(Vec<(String, Node)>),
}

impl Node {
    /// Walks `path` (object keys and stringified array indices) down from
    /// this node and returns the node the full path resolves to.
    ///
    /// Returns `None` when a segment does not resolve: a key that is absent
    /// or present more than once (duplicate keys are ambiguous, never
    /// guessed at), an index that is not a decimal integer or is out of
    /// range, or any segment applied to a scalar.
    pub fn find(&self, path: &[String]) -> Option<&Self> {
        let mut node = self;
        for segment in path {
            node = match &node.kind {
                NodeKind::Object(members) => {
                    let mut matches = members.iter().filter(|(key, _)| key == segment);
                    let (_, value) = matches.next()?;
                    if matches.next().is_some() {
                        return None;
                    }
                    value
                }
                NodeKind::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(node)
    }

    /// Evaluates the tree into a plain [`Value`], discarding spans.
    ///
    /// Duplicate object keys collapse to the last occurrence, matching
    /// what `serde_json` produces for the same document.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match &self.kind {
            NodeKind::Null => Value::Null,
            NodeKind::Bool(value) => Value::Bool(*value),
            NodeKind::Number(value) => Value::Number(value.clone()),
            NodeKind::String(value) => Value::String(value.clone()),
            NodeKind::Array(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            NodeKind::Object(members) => {
                let mut map = serde_json::Map::with_capacity(members.len());
                for (key, value) in members {
                    map.insert(key.clone(), value.to_value());
                }
                Value::Object(map)
            }
        }
    }
}

use alloc::string::String;
use alloc::vec::Vec;

use crate::{Diagnostic, Format, ScalarStyle, Value, MAP_TAG, SEQ_TAG};

/// The identifier of a node in a [`Document`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in [`Document::nodes`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// The source range of a node.
///
/// `start..value_end` covers the node itself; `end` also includes trailing
/// white space and comments that belong to it. The offsets are monotonic.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
#[non_exhaustive]
pub struct Range {
    pub start: usize,
    pub value_end: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, value_end: usize, end: usize) -> Range {
        Range {
            start,
            value_end,
            end,
        }
    }
}

/// The document structure.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct Document {
    /// The document nodes.
    pub nodes: Vec<Node>,
    /// The content node, or `None` for a document without content.
    pub contents: Option<NodeId>,
    pub range: Range,
    /// A comment before the content, separated from it by a blank line.
    pub comment_before: Option<String>,
    /// Comments after the content.
    pub comment: Option<String>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// The node structure.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Node {
    pub data: NodeData,
    pub range: Range,
    /// Comments on the lines before the node.
    pub comment_before: Option<String>,
    /// A comment after the node, on the same line.
    pub comment: Option<String>,
    /// Is the node preceded by a blank line?
    pub space_before: bool,
}

/// Node types.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Scalar(Scalar),
    /// A sequence node.
    Sequence {
        items: Vec<NodeId>,
        /// Always `true`; JSON5 has only flow collections.
        flow: bool,
    },
    /// A mapping node.
    Mapping {
        /// Pairs in source order. Duplicate keys are kept.
        pairs: Vec<Pair>,
        /// Always `true`; JSON5 has only flow collections.
        flow: bool,
    },
}

/// A scalar with its resolved value.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Scalar {
    pub value: Value,
    /// The raw source of the scalar, including any quotes.
    pub source: String,
    pub style: ScalarStyle,
    pub tag: String,
    pub format: Option<Format>,
}

impl Scalar {
    /// Create a plain scalar with no format.
    pub fn new(value: Value, source: impl Into<String>, tag: impl Into<String>) -> Scalar {
        Scalar {
            value,
            source: source.into(),
            style: ScalarStyle::Plain,
            tag: tag.into(),
            format: None,
        }
    }
}

/// An element of a mapping node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct Pair {
    pub key: NodeId,
    pub value: NodeId,
}

impl Node {
    fn new(data: NodeData, range: Range) -> Node {
        Node {
            data,
            range,
            comment_before: None,
            comment: None,
            space_before: false,
        }
    }

    /// The node tag: the scalar's resolved tag, or the sequence or mapping
    /// tag.
    pub fn tag(&self) -> &str {
        match &self.data {
            NodeData::Scalar(scalar) => &scalar.tag,
            NodeData::Sequence { .. } => SEQ_TAG,
            NodeData::Mapping { .. } => MAP_TAG,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.data {
            NodeData::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Add `comment` as a new line of [`Node::comment`].
    pub(crate) fn append_comment(&mut self, comment: &str) {
        self.comment = Some(match self.comment.take() {
            Some(existing) => format!("{existing}\n{comment}"),
            None => String::from(comment),
        });
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Document {
        Document {
            nodes: Vec::with_capacity(16),
            ..Document::default()
        }
    }

    /// Get a node of the document.
    ///
    /// Returns the node object or `None` if `id` is out of range.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a node of the document.
    ///
    /// Returns the node object or `None` if `id` is out of range.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the content node of the document.
    ///
    /// Returns `None` if the document is empty.
    pub fn get_root_node(&self) -> Option<&Node> {
        self.contents.and_then(|id| self.get_node(id))
    }

    /// Create a scalar node and attach it to the document.
    #[must_use]
    pub fn add_scalar(&mut self, scalar: Scalar, range: Range) -> NodeId {
        self.push(Node::new(NodeData::Scalar(scalar), range))
    }

    /// Create an empty sequence node and attach it to the document.
    #[must_use]
    pub fn add_sequence(&mut self, range: Range) -> NodeId {
        let data = NodeData::Sequence {
            items: Vec::new(),
            flow: true,
        };
        self.push(Node::new(data, range))
    }

    /// Create an empty mapping node and attach it to the document.
    #[must_use]
    pub fn add_mapping(&mut self, range: Range) -> NodeId {
        let data = NodeData::Mapping {
            pairs: Vec::new(),
            flow: true,
        };
        self.push(Node::new(data, range))
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Add an item to a sequence node.
    pub fn append_sequence_item(&mut self, sequence: NodeId, item: NodeId) {
        assert!(item.0 < self.nodes.len());
        match self.nodes.get_mut(sequence.0).map(|node| &mut node.data) {
            Some(NodeData::Sequence { items, .. }) => items.push(item),
            _ => panic!("node {} is not a sequence", sequence.0),
        }
    }

    /// Add a pair of a key and a value to a mapping node.
    pub fn append_mapping_pair(&mut self, mapping: NodeId, key: NodeId, value: NodeId) {
        assert!(key.0 < self.nodes.len());
        assert!(value.0 < self.nodes.len());
        match self.nodes.get_mut(mapping.0).map(|node| &mut node.data) {
            Some(NodeData::Mapping { pairs, .. }) => pairs.push(Pair { key, value }),
            _ => panic!("node {} is not a mapping", mapping.0),
        }
    }

    /// Find the value for `key` in a mapping node. The last matching pair
    /// wins.
    pub fn lookup(&self, mapping: NodeId, key: &str) -> Option<NodeId> {
        let Some(NodeData::Mapping { pairs, .. }) = self.get_node(mapping).map(|n| &n.data) else {
            return None;
        };
        pairs.iter().rev().find_map(|pair| {
            let scalar = self.get_node(pair.key)?.as_scalar()?;
            (scalar.value.as_str() == Some(key)).then_some(pair.value)
        })
    }

    /// Project the content into a plain [`Value`]. An empty document is
    /// [`Value::Null`].
    pub fn to_value(&self) -> Value {
        self.contents.map_or(Value::Null, |id| self.node_value(id))
    }

    /// Project the node `id` into a plain [`Value`].
    pub fn node_value(&self, id: NodeId) -> Value {
        let Some(node) = self.get_node(id) else {
            return Value::Null;
        };
        match &node.data {
            NodeData::Scalar(scalar) => scalar.value.clone(),
            NodeData::Sequence { items, .. } => {
                Value::Seq(items.iter().map(|&item| self.node_value(item)).collect())
            }
            NodeData::Mapping { pairs, .. } => Value::Map(
                pairs
                    .iter()
                    .map(|pair| (self.node_value(pair.key), self.node_value(pair.value)))
                    .collect(),
            ),
        }
    }
}

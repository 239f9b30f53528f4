//! Content nodes: the atomic blocks that pagination moves between pages.

use super::{List, Paragraph, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a content node, assigned when the node is created.
///
/// Measurements are keyed by this id, never by the node's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Largest id a persisted document may carry.
    ///
    /// `u64::MAX` is excluded so that reserving any persisted id always
    /// leaves room for the next fresh one.
    pub const MAX_PERSISTED: u64 = u64::MAX - 1;

    /// Allocate a fresh process-unique id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure ids handed out by [`NodeId::fresh`] never collide with `id`.
    ///
    /// Called for ids that come from a persisted document.
    pub fn reserve(id: NodeId) {
        if let Some(next) = id.0.checked_add(1) {
            NEXT_NODE_ID.fetch_max(next, Ordering::Relaxed);
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Error parsing a persisted node id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    /// Not a number
    #[error("{0}")]
    Invalid(#[from] std::num::ParseIntError),

    /// Above [`NodeId::MAX_PERSISTED`]
    #[error("node id {0} is out of range")]
    OutOfRange(u64),
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('n');
        let id: u64 = digits.parse()?;
        if id > NodeId::MAX_PERSISTED {
            return Err(NodeIdError::OutOfRange(id));
        }
        Ok(NodeId(id))
    }
}

/// A block-level unit of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Stable identity
    pub id: NodeId,

    /// Typed payload
    pub block: Block,
}

impl ContentNode {
    /// Wrap a block in a node with a fresh id.
    pub fn new(block: Block) -> Self {
        Self {
            id: NodeId::fresh(),
            block,
        }
    }

    /// Wrap a block in a node with a known id.
    pub fn with_id(id: NodeId, block: Block) -> Self {
        NodeId::reserve(id);
        Self { id, block }
    }

    /// Create a paragraph node.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(Block::Paragraph(Paragraph::with_text(text)))
    }

    /// Create a heading node.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::new(Block::Paragraph(Paragraph::heading(text, level)))
    }

    /// Size of the node in position units.
    pub fn node_size(&self) -> usize {
        self.block.node_size()
    }

    /// Type tag of the node.
    pub fn kind(&self) -> &'static str {
        self.block.kind()
    }

    /// Get plain text content of the node.
    pub fn plain_text(&self) -> String {
        self.block.plain_text()
    }
}

/// Typed payload of a content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph or heading
    Paragraph(Paragraph),

    /// A bulleted or numbered list
    List(List),

    /// A table
    Table(Table),

    /// An image
    Image {
        /// Image source URL
        src: String,
        /// Alternative text
        alt_text: Option<String>,
        /// Declared width in layout units
        width: Option<f32>,
        /// Declared height in layout units
        height: Option<f32>,
    },

    /// A horizontal rule / separator
    HorizontalRule,

    /// Opaque markup the model does not interpret
    Raw {
        /// Raw HTML fragment
        html: String,
    },
}

impl Block {
    /// Create an image block.
    pub fn image(src: impl Into<String>) -> Self {
        Block::Image {
            src: src.into(),
            alt_text: None,
            width: None,
            height: None,
        }
    }

    /// Create an image block with dimensions.
    pub fn image_with_size(src: impl Into<String>, width: f32, height: f32) -> Self {
        Block::Image {
            src: src.into(),
            alt_text: None,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Size in position units. Atoms occupy a single position.
    pub fn node_size(&self) -> usize {
        match self {
            Block::Paragraph(p) => p.node_size(),
            Block::List(l) => l.node_size(),
            Block::Table(t) => t.node_size(),
            Block::Image { .. } | Block::HorizontalRule | Block::Raw { .. } => 1,
        }
    }

    /// Type tag, distinguishing headings from paragraphs.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(p) if p.is_heading() => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::List(_) => "list",
            Block::Table(_) => "table",
            Block::Image { .. } => "image",
            Block::HorizontalRule => "horizontal_rule",
            Block::Raw { .. } => "raw",
        }
    }

    /// Get plain text content of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.plain_text(),
            Block::List(l) => l.plain_text(),
            Block::Table(t) => t.plain_text(),
            Block::Image { alt_text, .. } => alt_text.clone().unwrap_or_default(),
            Block::HorizontalRule | Block::Raw { .. } => String::new(),
        }
    }

    /// Check if this block is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Paragraph(p) if p.is_heading())
    }
}

/// A contiguous run of content nodes cut from, or destined for, a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Nodes in document order
    pub nodes: Vec<ContentNode>,
}

impl Slice {
    /// Create a slice from nodes.
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        Self { nodes }
    }

    /// Create an empty slice.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total size of the slice in position units.
    pub fn size(&self) -> usize {
        self.nodes.iter().map(ContentNode::node_size).sum()
    }

    /// Number of nodes in the slice.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the slice holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node identities in order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }
}

impl From<Vec<ContentNode>> for Slice {
    fn from(nodes: Vec<ContentNode>) -> Self {
        Self::new(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reserve_skips_persisted_ids() {
        let high = NodeId(NodeId::fresh().0 + 1_000);
        NodeId::reserve(high);
        assert!(NodeId::fresh() > high);
    }

    #[test]
    fn test_node_id_parse_display() {
        let id: NodeId = "n42".parse().unwrap();
        assert_eq!(id, NodeId(42));
        assert_eq!(id.to_string(), "n42");
        assert_eq!("7".parse::<NodeId>().unwrap(), NodeId(7));
        assert!("x".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_max_is_rejected() {
        assert_eq!(
            "n18446744073709551615".parse::<NodeId>(),
            Err(NodeIdError::OutOfRange(u64::MAX))
        );
        let last = format!("n{}", NodeId::MAX_PERSISTED);
        assert_eq!(last.parse::<NodeId>(), Ok(NodeId(NodeId::MAX_PERSISTED)));
    }

    #[test]
    fn test_block_sizes_and_kinds() {
        assert_eq!(Block::image("a.png").node_size(), 1);
        assert_eq!(Block::HorizontalRule.node_size(), 1);
        assert_eq!(ContentNode::paragraph("hello").node_size(), 7);

        assert_eq!(ContentNode::heading("T", 2).kind(), "heading");
        assert_eq!(ContentNode::paragraph("T").kind(), "paragraph");
        assert!(Block::image("a.png").kind() == "image");
    }

    #[test]
    fn test_slice_size() {
        let slice = Slice::new(vec![
            ContentNode::paragraph("ab"),
            ContentNode::new(Block::HorizontalRule),
        ]);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.size(), 5);
        assert!(Slice::empty().is_empty());
    }
}

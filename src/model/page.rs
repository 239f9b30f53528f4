//! Page-level types.

use super::{Block, ContentNode, NodeId, Paragraph};
use serde::{Deserialize, Serialize};

/// A page container holding content nodes in order.
///
/// The page itself has no height; the nominal content height is a
/// pagination setting shared by all pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Content nodes on the page
    pub elements: Vec<ContentNode>,
}

impl Page {
    /// Create a new empty page.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Create a page holding the given nodes.
    pub fn with_elements(elements: Vec<ContentNode>) -> Self {
        Self { elements }
    }

    /// Add a node to the page.
    pub fn add_node(&mut self, node: ContentNode) {
        self.elements.push(node);
    }

    /// Add a block to the page, wrapping it in a node with a fresh id.
    pub fn add_block(&mut self, block: Block) -> NodeId {
        let node = ContentNode::new(block);
        let id = node.id;
        self.elements.push(node);
        id
    }

    /// Add a paragraph to the page.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) -> NodeId {
        self.add_block(Block::Paragraph(paragraph))
    }

    /// Size of the page's content in position units.
    pub fn content_size(&self) -> usize {
        self.elements.iter().map(ContentNode::node_size).sum()
    }

    /// Size of the page node in position units (open + content + close).
    pub fn node_size(&self) -> usize {
        2 + self.content_size()
    }

    /// Offset of child `index` relative to the start of the page content.
    ///
    /// `index == block_count()` yields the content size.
    pub fn child_offset(&self, index: usize) -> usize {
        self.elements
            .iter()
            .take(index)
            .map(ContentNode::node_size)
            .sum()
    }

    /// Index of the child with the given id.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.elements.iter().position(|n| n.id == id)
    }

    /// Identities of the children in order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.elements.iter().map(|n| n.id).collect()
    }

    /// Get plain text content of the page.
    pub fn plain_text(&self) -> String {
        self.elements
            .iter()
            .map(|node| node.plain_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Check if the page is empty (no content nodes).
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get the number of nodes on the page.
    pub fn block_count(&self) -> usize {
        self.elements.len()
    }
}

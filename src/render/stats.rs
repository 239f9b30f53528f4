//! Content statistics of a paged document.

use crate::model::{Block, Document};
use serde::{Deserialize, Serialize};

/// Counts of the blocks and text in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of pages
    pub page_count: u32,

    /// Number of pages without content
    pub empty_page_count: u32,

    /// Number of paragraphs (headings excluded)
    pub paragraph_count: u32,

    /// Number of headings
    pub heading_count: u32,

    /// Number of tables
    pub table_count: u32,

    /// Number of images
    pub image_count: u32,

    /// Number of lists
    pub list_count: u32,

    /// Number of list items across all lists
    pub list_item_count: u32,

    /// Number of horizontal rules
    pub horizontal_rule_count: u32,

    /// Number of raw markup blocks
    pub raw_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl DocumentStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics for a whole document.
    pub fn collect(doc: &Document) -> Self {
        let mut stats = Self::new();
        for page in doc.pages() {
            stats.page_count += 1;
            if page.is_empty() {
                stats.empty_page_count += 1;
            }
            for node in &page.elements {
                match &node.block {
                    Block::Paragraph(p) if p.is_heading() => stats.heading_count += 1,
                    Block::Paragraph(_) => stats.paragraph_count += 1,
                    Block::List(list) => {
                        stats.list_count += 1;
                        stats.list_item_count += list.items.len() as u32;
                    }
                    Block::Table(_) => stats.table_count += 1,
                    Block::Image { .. } => stats.image_count += 1,
                    Block::HorizontalRule => stats.horizontal_rule_count += 1,
                    Block::Raw { .. } => stats.raw_count += 1,
                }
                stats.count_text(&node.plain_text());
            }
        }
        stats
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Total number of content nodes counted.
    pub fn block_count(&self) -> u32 {
        self.paragraph_count
            + self.heading_count
            + self.list_count
            + self.table_count
            + self.image_count
            + self.horizontal_rule_count
            + self.raw_count
    }
}

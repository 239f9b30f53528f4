//! Height measurement of content nodes.
//!
//! The [`Measurer`] trait is the seam between the pagination engine and
//! whatever renders the document: a live rendering surface, a headless
//! layout estimate ([`EstimatingMeasurer`]) or a deterministic test stub
//! ([`FixedMeasurer`]). Heights are looked up by node identity.

use crate::model::{Block, ContentNode, NodeId, Page, Paragraph, Table};
use std::collections::{HashMap, HashSet};

/// Supplies the rendered height of content nodes, in layout units.
pub trait Measurer {
    /// Rendered height of a node, or `None` if it is not mounted.
    fn measure(&self, node: &ContentNode) -> Option<f32>;

    /// Natural height of a page's content region.
    ///
    /// Returns `None` when any child cannot be measured, which makes the
    /// page unmeasurable for the current pass.
    fn content_height(&self, page: &Page) -> Option<f32> {
        page.elements.iter().map(|node| self.measure(node)).sum()
    }
}

impl<M: Measurer + ?Sized> Measurer for &M {
    fn measure(&self, node: &ContentNode) -> Option<f32> {
        (**self).measure(node)
    }

    fn content_height(&self, page: &Page) -> Option<f32> {
        (**self).content_height(page)
    }
}

impl<M: Measurer + ?Sized> Measurer for Box<M> {
    fn measure(&self, node: &ContentNode) -> Option<f32> {
        (**self).measure(node)
    }

    fn content_height(&self, page: &Page) -> Option<f32> {
        (**self).content_height(page)
    }
}

/// Measurer returning fixed heights keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct FixedMeasurer {
    heights: HashMap<NodeId, f32>,
    hidden: HashSet<NodeId>,
    default_height: Option<f32>,
}

impl FixedMeasurer {
    /// Create a measurer with no known heights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Height reported for nodes without an explicit entry.
    pub fn with_default(mut self, height: f32) -> Self {
        self.default_height = Some(height);
        self
    }

    /// Builder form of [`FixedMeasurer::set`].
    pub fn with(mut self, id: NodeId, height: f32) -> Self {
        self.set(id, height);
        self
    }

    /// Set the height of a node.
    pub fn set(&mut self, id: NodeId, height: f32) {
        self.heights.insert(id, height);
    }

    /// Treat a node as unmounted until [`FixedMeasurer::show`] is called.
    pub fn hide(&mut self, id: NodeId) {
        self.hidden.insert(id);
    }

    /// Make a hidden node measurable again.
    pub fn show(&mut self, id: NodeId) {
        self.hidden.remove(&id);
    }
}

impl Measurer for FixedMeasurer {
    fn measure(&self, node: &ContentNode) -> Option<f32> {
        if self.hidden.contains(&node.id) {
            return None;
        }
        self.heights.get(&node.id).copied().or(self.default_height)
    }
}

/// Headless height estimate from text length and block type.
///
/// Assumes a single column of fixed-width glyphs; accurate enough to
/// paginate a document without a rendering surface.
#[derive(Debug, Clone)]
pub struct EstimatingMeasurer {
    /// Height of one line of body text
    pub line_height: f32,

    /// Characters that fit on one line of body text
    pub chars_per_line: usize,

    /// Vertical space after each block
    pub block_spacing: f32,

    /// Extra height per table row (borders and padding)
    pub table_row_padding: f32,

    /// Height of an image without a declared height
    pub image_height: f32,

    /// Height of a horizontal rule
    pub rule_height: f32,
}

/// Font size of headings h1-h6 relative to body text.
const HEADING_SCALE: [f32; 6] = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67];

impl EstimatingMeasurer {
    /// Create a measurer for 16-unit body text on a 6.5 inch wide column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body line height.
    pub fn with_line_height(mut self, height: f32) -> Self {
        self.line_height = height;
        self
    }

    /// Set the number of characters per line.
    pub fn with_chars_per_line(mut self, chars: usize) -> Self {
        self.chars_per_line = chars.max(1);
        self
    }

    /// Number of wrapped lines needed for a paragraph in `width` characters.
    fn line_count(paragraph: &Paragraph, width: usize) -> usize {
        let width = width.max(1);
        paragraph
            .plain_text()
            .split('\n')
            .map(|segment| segment.chars().count().div_ceil(width).max(1))
            .sum()
    }

    fn paragraph_height(&self, paragraph: &Paragraph) -> f32 {
        let scale = paragraph
            .heading_level()
            .map(|level| HEADING_SCALE[(level.clamp(1, 6) - 1) as usize])
            .unwrap_or(1.0);
        // Larger glyphs fit fewer characters per line.
        let width = (self.chars_per_line as f32 / scale) as usize;
        Self::line_count(paragraph, width) as f32 * self.line_height * scale
    }

    fn table_height(&self, table: &Table) -> f32 {
        table
            .rows
            .iter()
            .map(|row| {
                let columns = row.cells.len().max(1);
                let width = self.chars_per_line / columns;
                let lines = row
                    .cells
                    .iter()
                    .map(|cell| {
                        cell.content
                            .iter()
                            .map(|p| Self::line_count(p, width))
                            .sum::<usize>()
                            .max(1)
                    })
                    .max()
                    .unwrap_or(1);
                lines as f32 * self.line_height + self.table_row_padding
            })
            .sum()
    }
}

impl Default for EstimatingMeasurer {
    fn default() -> Self {
        Self {
            line_height: 24.0,
            chars_per_line: 90,
            block_spacing: 16.0,
            table_row_padding: 9.0,
            image_height: 240.0,
            rule_height: 17.0,
        }
    }
}

impl Measurer for EstimatingMeasurer {
    fn measure(&self, node: &ContentNode) -> Option<f32> {
        let body = match &node.block {
            Block::Paragraph(p) => self.paragraph_height(p),
            Block::List(list) => {
                let width = self.chars_per_line.saturating_sub(4);
                list.items
                    .iter()
                    .map(|item| Self::line_count(item, width) as f32 * self.line_height)
                    .sum()
            }
            Block::Table(table) => self.table_height(table),
            Block::Image { height, .. } => height.unwrap_or(self.image_height),
            Block::HorizontalRule => return Some(self.rule_height),
            Block::Raw { .. } => self.line_height,
        };
        Some(body + self.block_spacing)
    }
}

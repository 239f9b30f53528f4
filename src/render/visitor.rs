//! Visitor pattern for customizing document rendering.
//!
//! The visitor pattern allows users to customize how different document
//! elements are rendered without modifying the core rendering logic.
//!
//! # Example
//!
//! ```
//! use pageflow::render::visitor::{DocumentVisitor, VisitorAction};
//! use pageflow::model::{ContentNode, Table};
//!
//! struct CustomTableVisitor;
//!
//! impl DocumentVisitor for CustomTableVisitor {
//!     fn visit_table(&mut self, _node: &ContentNode, _table: &Table) -> VisitorAction {
//!         VisitorAction::Replace("<!-- table omitted -->".to_string())
//!     }
//! }
//! ```

use crate::model::{ContentNode, List, Paragraph, Table};

/// Action returned by visitor methods to control rendering behavior.
#[derive(Debug, Clone, Default)]
pub enum VisitorAction {
    /// Continue with default rendering.
    #[default]
    Continue,

    /// Replace the element with custom output.
    Replace(String),

    /// Skip this element entirely (produce no output).
    Skip,
}

impl VisitorAction {
    /// Check if this action indicates the element should be skipped.
    pub fn should_skip(&self) -> bool {
        matches!(self, VisitorAction::Skip)
    }

    /// Check if this action provides replacement content.
    pub fn is_replace(&self) -> bool {
        matches!(self, VisitorAction::Replace(_))
    }

    /// Get replacement content if available.
    pub fn replacement(&self) -> Option<&str> {
        match self {
            VisitorAction::Replace(s) => Some(s),
            _ => None,
        }
    }
}

/// Trait for visiting content nodes during rendering.
///
/// Each method receives the node (for its identity) and its typed payload.
/// All methods return `VisitorAction::Continue` by default.
pub trait DocumentVisitor {
    /// Called before rendering a paragraph that is not a heading.
    fn visit_paragraph(&mut self, node: &ContentNode, para: &Paragraph) -> VisitorAction {
        let _ = (node, para);
        VisitorAction::Continue
    }

    /// Called before rendering a heading.
    fn visit_heading(&mut self, node: &ContentNode, para: &Paragraph, level: u8) -> VisitorAction {
        let _ = (node, para, level);
        VisitorAction::Continue
    }

    /// Called before rendering a list.
    fn visit_list(&mut self, node: &ContentNode, list: &List) -> VisitorAction {
        let _ = (node, list);
        VisitorAction::Continue
    }

    /// Called before rendering a table.
    fn visit_table(&mut self, node: &ContentNode, table: &Table) -> VisitorAction {
        let _ = (node, table);
        VisitorAction::Continue
    }

    /// Called before rendering an image.
    fn visit_image(&mut self, node: &ContentNode, src: &str, alt: Option<&str>) -> VisitorAction {
        let _ = (node, src, alt);
        VisitorAction::Continue
    }

    /// Called before rendering a horizontal rule.
    fn visit_horizontal_rule(&mut self, node: &ContentNode) -> VisitorAction {
        let _ = node;
        VisitorAction::Continue
    }

    /// Called before rendering raw markup.
    fn visit_raw(&mut self, node: &ContentNode, html: &str) -> VisitorAction {
        let _ = (node, html);
        VisitorAction::Continue
    }

    /// Called at the start of rendering a page.
    ///
    /// `index` is the 0-based physical page index.
    fn on_page_start(&mut self, index: usize) {
        let _ = index;
    }

    /// Called at the end of rendering a page.
    fn on_page_end(&mut self, index: usize) {
        let _ = index;
    }
}

/// Dispatch a node to the matching visitor method.
pub(crate) fn visit_node(visitor: &mut dyn DocumentVisitor, node: &ContentNode) -> VisitorAction {
    use crate::model::Block;

    match &node.block {
        Block::Paragraph(p) => match p.heading_level() {
            Some(level) => visitor.visit_heading(node, p, level),
            None => visitor.visit_paragraph(node, p),
        },
        Block::List(list) => visitor.visit_list(node, list),
        Block::Table(table) => visitor.visit_table(node, table),
        Block::Image { src, alt_text, .. } => visitor.visit_image(node, src, alt_text.as_deref()),
        Block::HorizontalRule => visitor.visit_horizontal_rule(node),
        Block::Raw { html } => visitor.visit_raw(node, html),
    }
}

/// Default visitor that performs no customization.
///
/// All visit methods return `VisitorAction::Continue`.
#[derive(Debug, Clone, Default)]
pub struct DefaultVisitor;

impl DefaultVisitor {
    /// Create a new default visitor.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentVisitor for DefaultVisitor {}

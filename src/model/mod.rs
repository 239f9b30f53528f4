//! Document model: pages of atomic content nodes addressed by positions.
//!
//! The model is a two-level tree. The root holds only [`Page`]s and each page
//! holds [`ContentNode`]s. Every node has a size in position units, so any
//! absolute position maps to page and child coordinates (see
//! [`Document::resolve`]). Structural changes are expressed as
//! [`Transaction`]s and committed atomically.

mod document;
mod node;
mod page;
mod paragraph;
mod table;
mod transaction;

pub use document::{Document, Metadata, Outline, OutlineItem};
pub use node::{Block, ContentNode, NodeId, NodeIdError, Slice};
pub use page::Page;
pub use paragraph::{
    Alignment, InlineContent, List, Paragraph, ParagraphStyle, TextRun, TextStyle,
};
pub use table::{Table, TableCell, TableRow};
pub use transaction::{ResolvedPos, Step, Transaction};

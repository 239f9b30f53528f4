//! Error types for the pageflow library.

use crate::model::NodeId;
use std::io;
use thiserror::Error;

/// Result type alias for pageflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while editing, paginating or serializing a document.
///
/// Layout conditions (an unmeasurable page, a single node taller than a page)
/// are not errors; they surface as [`crate::layout::PassOutcome::Skipped`].
#[derive(Error, Debug)]
pub enum Error {
    /// A position lies beyond the document extent.
    #[error("Position {pos} is out of bounds (document size is {size})")]
    OutOfBounds {
        /// The offending position
        pos: usize,
        /// Current document content size
        size: usize,
    },

    /// A position points inside a content node instead of at a node boundary.
    #[error("Position {0} does not fall on a node boundary")]
    MisalignedPosition(usize),

    /// A range is reversed or spans a partial page.
    #[error("Invalid range {from}..{to}")]
    InvalidRange {
        /// Range start
        from: usize,
        /// Range end
        to: usize,
    },

    /// The same node identity appears more than once after a mutation.
    #[error("Duplicate node identity: {0}")]
    DuplicateNode(NodeId),

    /// A mutation would leave the document without any page.
    #[error("Document must contain at least one page")]
    EmptyDocument,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Pagination did not settle within the allowed number of passes.
    #[error("Pagination did not converge after {0} passes")]
    NotConverged(usize),

    /// The input could not be parsed into a paged document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The input format is not recognized.
    #[error("Unknown input format: expected HTML or JSON")]
    UnknownFormat,

    /// Error during rendering (HTML, text).
    #[error("Rendering error: {0}")]
    Render(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed markup in the HTML persisted form.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Check if this error was caused by a bad position or range argument.
    pub fn is_position_error(&self) -> bool {
        matches!(
            self,
            Error::OutOfBounds { .. } | Error::MisalignedPosition(_) | Error::InvalidRange { .. }
        )
    }
}

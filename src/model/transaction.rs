//! Positions and structural transactions.

use super::Slice;

/// Where an absolute document position falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPos {
    /// Between top-level pages; `index` is the page that follows
    /// (`page_count` for the end of the document).
    PageBoundary {
        /// Index of the page after this position
        index: usize,
    },

    /// Inside page `page`, directly before child `index`
    /// (`index == len` for the end of the page content).
    ChildBoundary {
        /// Page index
        page: usize,
        /// Child index within the page
        index: usize,
    },

    /// Inside the content of a node; not a valid split or insert point.
    Inside {
        /// Page index
        page: usize,
        /// Index of the enclosing child
        child: usize,
    },
}

impl ResolvedPos {
    /// Check if the position lies on a node boundary.
    pub fn is_boundary(&self) -> bool {
        !matches!(self, ResolvedPos::Inside { .. })
    }
}

/// A single structural change.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Insert nodes at a position. At a page boundary the nodes are wrapped
    /// in a new page.
    Insert {
        /// Absolute position
        at: usize,
        /// Nodes to insert
        slice: Slice,
    },

    /// Remove the nodes between two boundaries.
    Delete {
        /// Range start
        from: usize,
        /// Range end (exclusive)
        to: usize,
    },
}

/// An ordered group of steps committed atomically by
/// [`Document::apply`](super::Document::apply).
///
/// Each step sees the positions produced by the steps before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    steps: Vec<Step>,
}

impl Transaction {
    /// Create an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an insert step.
    pub fn insert(mut self, at: usize, slice: impl Into<Slice>) -> Self {
        self.steps.push(Step::Insert {
            at,
            slice: slice.into(),
        });
        self
    }

    /// Append a delete step.
    pub fn delete(mut self, from: usize, to: usize) -> Self {
        self.steps.push(Step::Delete { from, to });
        self
    }

    /// Steps in application order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the transaction has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

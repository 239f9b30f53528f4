//! # Re-flow Planning
//!
//! Decides where an overflowing page splits and builds the transaction that
//! moves the overflow suffix forward. Nodes are atomic: the split always
//! falls between two children, never inside one.

use super::OverflowReport;
use crate::error::Result;
use crate::model::{Document, NodeId, Transaction};

/// Where an overflowing page should split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDecision {
    /// The children fit within the nominal height.
    Fits,
    /// Children from `index` onwards move to the next page.
    Split {
        /// Index of the first child that moves
        index: usize,
    },
    /// A single child is taller than the page and cannot be split.
    Oversized,
}

/// Given child heights and the nominal height, find the split point.
///
/// The split index is the smallest `k` with `h[0] + .. + h[k] > nominal`.
/// When `k == 0` the first child stays (it is allowed to overflow its page)
/// and the split moves to index 1; a lone oversized child yields
/// [`SplitDecision::Oversized`].
pub fn decide_split(heights: &[f32], nominal_height: f32) -> SplitDecision {
    let mut running = 0.0;
    for (index, &height) in heights.iter().enumerate() {
        running += height;
        if running <= nominal_height {
            continue;
        }
        return match index {
            0 if heights.len() > 1 => SplitDecision::Split { index: 1 },
            0 => SplitDecision::Oversized,
            _ => SplitDecision::Split { index },
        };
    }
    SplitDecision::Fits
}

/// Where the moved slice lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Prepended to the content of the existing next page.
    NextPage {
        /// Index of the receiving page
        page_index: usize,
    },
    /// Wrapped in a new page inserted after the overflowing one.
    NewPage {
        /// Index the new page will have
        page_index: usize,
    },
}

/// A planned move of an overflow suffix, ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflowMove {
    /// Index of the overflowing page
    pub page_index: usize,
    /// Index of the first moved child within the page
    pub split_index: usize,
    /// Absolute position of the split
    pub split_pos: usize,
    /// Absolute position of the end of the page content
    pub end_pos: usize,
    /// Identities of the moved nodes, in order
    pub moved: Vec<NodeId>,
    /// Destination of the moved nodes
    pub target: MoveTarget,
    /// Insert-then-delete transaction performing the move
    pub transaction: Transaction,
}

/// Outcome of planning against an overflow report.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Move the overflow suffix.
    Move(ReflowMove),
    /// The page holds a single child taller than the page.
    Oversized,
    /// The children add up to no more than the nominal height.
    ///
    /// Happens when [`Measurer::content_height`](super::Measurer::content_height)
    /// counts space outside the children.
    Fits,
    /// The report no longer matches the document.
    Stale,
}

/// Builds re-flow moves from overflow reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflowPlanner;

impl ReflowPlanner {
    /// Create a new planner.
    pub fn new() -> Self {
        Self
    }

    /// Plan the move for an overflowing page.
    ///
    /// The report's split child is located by id in the current document, so
    /// a report taken before an unrelated edit still yields a correct move.
    pub fn plan(&self, doc: &Document, report: &OverflowReport) -> Result<Plan> {
        let split = match decide_split(&report.heights(), report.nominal_height) {
            SplitDecision::Fits => return Ok(Plan::Fits),
            SplitDecision::Oversized => return Ok(Plan::Oversized),
            SplitDecision::Split { index } => index,
        };

        let split_id = report.children[split].id;
        let Some((page_index, split_index)) = doc.locate(split_id) else {
            log::warn!("split node {} is gone, dropping stale report", split_id);
            return Ok(Plan::Stale);
        };
        if page_index != report.page_index {
            log::warn!(
                "split node {} moved from page {} to {}, dropping stale report",
                split_id,
                report.page_index,
                page_index
            );
            return Ok(Plan::Stale);
        }

        let page = &doc.pages()[page_index];
        let split_pos = doc.page_content_start(page_index)? + page.child_offset(split_index);
        let end_pos = doc.page_content_end(page_index)?;
        if split_pos >= end_pos {
            return Ok(Plan::Stale);
        }

        let slice = doc.slice(split_pos, end_pos)?;
        let moved = slice.ids();

        // The next page starts right after this page's closing token.
        let next_page_pos = end_pos + 1;
        let (insert_at, target) = if page_index + 1 < doc.page_count() {
            (
                next_page_pos + 1,
                MoveTarget::NextPage {
                    page_index: page_index + 1,
                },
            )
        } else {
            (
                next_page_pos,
                MoveTarget::NewPage {
                    page_index: page_index + 1,
                },
            )
        };

        // The insert lies after the deleted range, so the delete positions
        // are unaffected by it.
        let transaction = Transaction::new()
            .insert(insert_at, slice)
            .delete(split_pos, end_pos);

        Ok(Plan::Move(ReflowMove {
            page_index,
            split_index,
            split_pos,
            end_pos,
            moved,
            target,
            transaction,
        }))
    }
}

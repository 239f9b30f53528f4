//! The pagination driver.
//!
//! [`Paginator`] ties the document, a [`Measurer`], the [`LayoutObserver`]
//! and the [`ReflowPlanner`] together for a host event loop:
//!
//! ```text
//! edit ─► on_change ─► (debounce) ─► poll ─► check ─► plan ─► apply
//!   ▲                                                          │
//!   └──────────────────────── on_change ◄─────────────────────┘
//! ```
//!
//! Each pass commits at most one move; the commit schedules the next pass
//! exactly like a user edit would, so a cascade of overflows is resolved
//! one page per pass until the document is stable.
//!
//! # Example
//!
//! ```
//! use pageflow::layout::{settle, FixedMeasurer, Paginator, PaginationOptions};
//! use pageflow::model::{ContentNode, Document, Page};
//! use std::time::Instant;
//!
//! let nodes: Vec<_> = (0..3).map(|i| ContentNode::paragraph(format!("p{i}"))).collect();
//! let doc = Document::from_pages(vec![Page::with_elements(nodes)]);
//! let measurer = FixedMeasurer::new().with_default(400.0);
//!
//! let mut paginator = Paginator::new(doc, measurer, PaginationOptions::default());
//! paginator.mount(Instant::now());
//! let report = settle(&mut paginator, Instant::now(), 100).unwrap();
//!
//! assert_eq!(report.moves, 1);
//! assert_eq!(paginator.document().page_count(), 2);
//! ```

use super::{LayoutObserver, Measurer, PaginationOptions, Plan, ReflowMove, ReflowPlanner};
use crate::error::{Error, Result};
use crate::model::{Document, Slice, Transaction};
use std::time::Instant;

/// Why a pass left an overflowing page as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The page's only child is taller than the page.
    SingleOversizedNode,
    /// The page overflows, but its children alone fit the nominal height.
    ChildrenFit,
    /// The overflow report did not match the document.
    StaleReport,
}

/// Result of polling the paginator.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// No pass was due.
    Idle,
    /// A pass ran and no page overflows.
    Stable,
    /// A pass found an overflow it could not resolve.
    Skipped {
        /// Index of the overflowing page
        page_index: usize,
        /// Why nothing moved
        reason: SkipReason,
    },
    /// A pass moved an overflow suffix forward.
    Moved(ReflowMove),
}

impl PassOutcome {
    /// Check if the pass mutated the document.
    pub fn is_move(&self) -> bool {
        matches!(self, PassOutcome::Moved(_))
    }
}

/// Counters accumulated across passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationStats {
    /// Measurement passes run
    pub passes: usize,
    /// Moves committed
    pub moves: usize,
    /// Pages created by moves
    pub pages_created: usize,
    /// Passes that found an overflow they could not resolve
    pub skipped: usize,
}

/// Event-driven pagination of a document.
pub struct Paginator<M: Measurer> {
    document: Document,
    measurer: M,
    observer: LayoutObserver,
    planner: ReflowPlanner,
    options: PaginationOptions,
    stats: PaginationStats,
}

impl<M: Measurer> Paginator<M> {
    /// Create a paginator for a document.
    pub fn new(document: Document, measurer: M, options: PaginationOptions) -> Self {
        Self {
            observer: LayoutObserver::new(options.nominal_height, options.debounce()),
            document,
            measurer,
            planner: ReflowPlanner::new(),
            options,
            stats: PaginationStats::default(),
        }
    }

    /// The document being paginated.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Take the document back.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// The measurer.
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Mutable access to the measurer, e.g. after the host re-renders.
    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }

    /// Options in use.
    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    /// The observer and its debounce state.
    pub fn observer(&self) -> &LayoutObserver {
        &self.observer
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> PaginationStats {
        self.stats
    }

    /// Schedule the first pass once the document is mounted.
    pub fn mount(&mut self, now: Instant) {
        self.observer.mount(now, self.options.initial_delay());
    }

    /// Change notification: postpone the next pass by the debounce window.
    pub fn on_change(&mut self, now: Instant) {
        self.observer.notify_change(now);
    }

    /// Deadline the host should wake up at to call [`Paginator::poll`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.observer.next_deadline()
    }

    /// Commit an edit from the editing framework and notify the observer.
    pub fn edit(&mut self, tx: &Transaction, now: Instant) -> Result<()> {
        self.document.apply(tx)?;
        self.on_change(now);
        Ok(())
    }

    /// Insert content on behalf of the editing framework.
    pub fn insert_content(&mut self, at: usize, slice: impl Into<Slice>, now: Instant) -> Result<()> {
        self.edit(&Transaction::new().insert(at, slice), now)
    }

    /// Delete a range on behalf of the editing framework.
    pub fn delete_range(&mut self, from: usize, to: usize, now: Instant) -> Result<Slice> {
        let removed = self.document.delete_range(from, to)?;
        self.on_change(now);
        Ok(removed)
    }

    /// Force a page break at a child boundary.
    pub fn insert_page_break(&mut self, pos: usize, now: Instant) -> Result<()> {
        self.document.insert_page_break(pos)?;
        self.on_change(now);
        Ok(())
    }

    /// Run a pass if one is due.
    pub fn poll(&mut self, now: Instant) -> Result<PassOutcome> {
        if !self.observer.poll(now) {
            return Ok(PassOutcome::Idle);
        }
        self.run_pass(now)
    }

    /// Measure, and move at most one overflow suffix.
    ///
    /// A committed move counts as a document change and schedules the next
    /// pass; nothing loops here. An overflowing page that cannot be split is
    /// passed over so later pages still re-flow; the pass reports the first
    /// such page only when no page could be acted on.
    pub fn run_pass(&mut self, now: Instant) -> Result<PassOutcome> {
        self.stats.passes += 1;

        let mut first_skip = None;
        let mut next_page = 0;
        while let Some(report) = self
            .observer
            .check_from(&self.document, &self.measurer, next_page)
        {
            let page_index = report.page_index;
            next_page = page_index + 1;

            let reason = match self.planner.plan(&self.document, &report)? {
                Plan::Oversized => {
                    log::debug!(
                        "page {} holds a single node of {} units, leaving it to overflow",
                        page_index,
                        report.content_height
                    );
                    SkipReason::SingleOversizedNode
                }
                Plan::Fits => {
                    log::debug!(
                        "page {} measures {} units but its children fit",
                        page_index,
                        report.content_height
                    );
                    SkipReason::ChildrenFit
                }
                Plan::Stale => SkipReason::StaleReport,
                Plan::Move(mv) => {
                    let pages_before = self.document.page_count();
                    self.document.apply(&mv.transaction)?;
                    self.stats.moves += 1;
                    self.stats.pages_created += self.document.page_count() - pages_before;
                    log::debug!(
                        "page {} overflowed by {} units, moved {} node(s) to {:?}",
                        page_index,
                        report.excess(),
                        mv.moved.len(),
                        mv.target
                    );
                    self.on_change(now);
                    return Ok(PassOutcome::Moved(mv));
                }
            };
            first_skip.get_or_insert((page_index, reason));
        }

        match first_skip {
            Some((page_index, reason)) => {
                self.stats.skipped += 1;
                Ok(PassOutcome::Skipped { page_index, reason })
            }
            None => {
                log::debug!("pass {}: no page overflows", self.stats.passes);
                Ok(PassOutcome::Stable)
            }
        }
    }
}

/// Pass limit used by headless pagination.
pub const DEFAULT_MAX_PASSES: usize = 10_000;

/// Summary of a [`settle`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    /// Passes run
    pub passes: usize,
    /// Moves committed
    pub moves: usize,
    /// Passes that left an overflow in place
    pub skipped: usize,
}

/// Drive the paginator on a virtual clock until no pass is pending.
///
/// This stands in for a host event loop: it jumps to each deadline and
/// polls, exactly as a timer callback would. A paginator with nothing
/// scheduled is scheduled as if the document had just changed.
pub fn settle<M: Measurer>(
    paginator: &mut Paginator<M>,
    start: Instant,
    max_passes: usize,
) -> Result<SettleReport> {
    if paginator.next_deadline().is_none() {
        paginator.on_change(start);
    }

    let mut report = SettleReport {
        passes: 0,
        moves: 0,
        skipped: 0,
    };
    while let Some(deadline) = paginator.next_deadline() {
        if report.passes == max_passes {
            return Err(Error::NotConverged(max_passes));
        }
        match paginator.poll(deadline)? {
            PassOutcome::Idle => continue,
            PassOutcome::Moved(_) => report.moves += 1,
            PassOutcome::Skipped { .. } => report.skipped += 1,
            PassOutcome::Stable => {}
        }
        report.passes += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FixedMeasurer;
    use crate::model::{ContentNode, NodeId, Page};
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn paginator(heights: &[f32]) -> (Paginator<FixedMeasurer>, Vec<NodeId>) {
        let nodes: Vec<ContentNode> = (0..heights.len())
            .map(|i| ContentNode::paragraph(format!("block {}", i)))
            .collect();
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        let measurer = ids
            .iter()
            .zip(heights)
            .fold(FixedMeasurer::new(), |m, (id, h)| m.with(*id, *h));
        let doc = Document::from_pages(vec![Page::with_elements(nodes)]);
        (
            Paginator::new(doc, measurer, PaginationOptions::default()),
            ids,
        )
    }

    #[test]
    fn test_poll_before_deadline_is_idle() {
        let (mut p, _) = paginator(&[400.0, 400.0, 400.0]);
        let start = Instant::now();
        p.mount(start);
        assert_eq!(p.poll(start + ms(499)).unwrap(), PassOutcome::Idle);
        assert!(p.poll(start + ms(500)).unwrap().is_move());
    }

    #[test]
    fn test_move_schedules_next_pass() {
        let (mut p, ids) = paginator(&[400.0, 400.0, 400.0]);
        let start = Instant::now();
        p.on_change(start);

        let outcome = p.poll(start + ms(200)).unwrap();
        let PassOutcome::Moved(mv) = outcome else {
            panic!("expected a move");
        };
        assert_eq!(mv.moved, vec![ids[2]]);
        assert_eq!(p.next_deadline(), Some(start + ms(400)));

        assert_eq!(p.poll(start + ms(400)).unwrap(), PassOutcome::Stable);
        assert_eq!(p.next_deadline(), None);
        assert_eq!(p.stats().pages_created, 1);
    }

    #[test]
    fn test_oversized_single_node_is_skipped() {
        let (mut p, _) = paginator(&[1200.0]);
        let start = Instant::now();
        p.on_change(start);

        assert_eq!(
            p.poll(start + ms(200)).unwrap(),
            PassOutcome::Skipped {
                page_index: 0,
                reason: SkipReason::SingleOversizedNode
            }
        );
        assert_eq!(p.next_deadline(), None);
        assert_eq!(p.document().version(), 0);
    }

    #[test]
    fn test_oversized_page_does_not_block_later_pages() {
        let nodes: Vec<ContentNode> = (0..3)
            .map(|i| ContentNode::paragraph(format!("block {}", i)))
            .collect();
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        let measurer = FixedMeasurer::new()
            .with(ids[0], 1200.0)
            .with(ids[1], 500.0)
            .with(ids[2], 500.0);
        let mut first = nodes;
        let second = first.split_off(1);
        let doc = Document::from_pages(vec![
            Page::with_elements(first),
            Page::with_elements(second),
        ]);
        let mut p = Paginator::new(doc, measurer, PaginationOptions::default());

        let outcome = p.run_pass(Instant::now()).unwrap();
        let PassOutcome::Moved(mv) = outcome else {
            panic!("expected a move, got {:?}", outcome);
        };
        assert_eq!(mv.page_index, 1);
        assert_eq!(mv.moved, vec![ids[2]]);

        assert_eq!(
            p.run_pass(Instant::now()).unwrap(),
            PassOutcome::Skipped {
                page_index: 0,
                reason: SkipReason::SingleOversizedNode
            }
        );
        assert_eq!(p.stats().skipped, 1);
    }

    /// Reports every page as 100 units taller than its children.
    struct PaddedMeasurer(FixedMeasurer);

    impl Measurer for PaddedMeasurer {
        fn measure(&self, node: &ContentNode) -> Option<f32> {
            self.0.measure(node)
        }

        fn content_height(&self, page: &Page) -> Option<f32> {
            self.0.content_height(page).map(|h| h + 100.0)
        }
    }

    #[test]
    fn test_padding_overflow_with_fitting_children() {
        let nodes = vec![ContentNode::paragraph("a"), ContentNode::paragraph("b")];
        let doc = Document::from_pages(vec![Page::with_elements(nodes)]);
        let measurer = PaddedMeasurer(FixedMeasurer::new().with_default(400.0));
        let mut p = Paginator::new(doc, measurer, PaginationOptions::default());

        assert_eq!(
            p.run_pass(Instant::now()).unwrap(),
            PassOutcome::Skipped {
                page_index: 0,
                reason: SkipReason::ChildrenFit
            }
        );
        assert_eq!(p.document().page_count(), 1);
        assert_eq!(p.next_deadline(), None);
    }

    #[test]
    fn test_settle_cascade() {
        let (mut p, ids) = paginator(&[500.0; 6]);
        let report = settle(&mut p, Instant::now(), 50).unwrap();

        assert_eq!(p.document().page_count(), 6);
        assert_eq!(p.document().node_ids(), ids);
        assert_eq!(report.moves, 5);
        assert_eq!(report.passes, 6);
    }

    #[test]
    fn test_settle_not_converged() {
        let (mut p, _) = paginator(&[500.0; 6]);
        let err = settle(&mut p, Instant::now(), 2).unwrap_err();
        assert!(matches!(err, Error::NotConverged(2)));
    }

    #[test]
    fn test_edit_notifies_observer() {
        let (mut p, _) = paginator(&[100.0]);
        let start = Instant::now();
        let end = p.document().page_content_end(0).unwrap();
        p.insert_content(end, vec![ContentNode::paragraph("more")], start)
            .unwrap();
        assert_eq!(p.next_deadline(), Some(start + ms(200)));
        assert_eq!(p.document().version(), 1);
    }

    #[test]
    fn test_failed_edit_does_not_notify() {
        let (mut p, _) = paginator(&[100.0]);
        let err = p
            .insert_content(999, vec![ContentNode::paragraph("x")], Instant::now())
            .unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
        assert_eq!(p.next_deadline(), None);
    }
}

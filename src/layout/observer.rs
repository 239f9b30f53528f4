//! Overflow detection with a debounced trigger.

use super::Measurer;
use crate::model::{Document, NodeId};
use std::time::{Duration, Instant};

/// A single pending deadline, rescheduled on every trigger (last write wins).
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending deadline with `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.schedule_after(now, self.delay);
    }

    /// Replace any pending deadline with `now + delay`, using a one-off delay.
    pub fn schedule_after(&mut self, now: Instant, delay: Duration) {
        self.pending = Some(now + delay);
    }

    /// Drop the pending deadline.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Check if a deadline is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Consume the deadline if it has passed. Returns true at most once per
    /// scheduled deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

/// Measured height of one child of an overflowing page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredChild {
    /// Node identity
    pub id: NodeId,
    /// Rendered height
    pub height: f32,
}

/// The first overflowing page found by a measurement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct OverflowReport {
    /// Index of the overflowing page
    pub page_index: usize,
    /// Children of the page with their heights, in order
    pub children: Vec<MeasuredChild>,
    /// Measured content height of the page
    pub content_height: f32,
    /// Nominal height the page exceeded
    pub nominal_height: f32,
}

impl OverflowReport {
    /// Child heights in order.
    pub fn heights(&self) -> Vec<f32> {
        self.children.iter().map(|c| c.height).collect()
    }

    /// Amount by which the page exceeds its nominal height.
    pub fn excess(&self) -> f32 {
        self.content_height - self.nominal_height
    }
}

/// Watches the document for overflowing pages.
///
/// The observer never mutates the document. It owns the debounce state that
/// decides when the next measurement pass is due.
#[derive(Debug, Clone)]
pub struct LayoutObserver {
    nominal_height: f32,
    debouncer: Debouncer,
}

impl LayoutObserver {
    /// Create an observer for pages of the given nominal height.
    pub fn new(nominal_height: f32, debounce: Duration) -> Self {
        Self {
            nominal_height,
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Nominal page content height.
    pub fn nominal_height(&self) -> f32 {
        self.nominal_height
    }

    /// Debounce state.
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Schedule the first pass after the document has been mounted.
    pub fn mount(&mut self, now: Instant, initial_delay: Duration) {
        self.debouncer.schedule_after(now, initial_delay);
    }

    /// Record a committed document change; postpones the pending pass.
    pub fn notify_change(&mut self, now: Instant) {
        self.debouncer.schedule(now);
    }

    /// Check if a measurement pass is due, consuming the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.debouncer.fire(now)
    }

    /// Deadline of the next pass, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Measure pages in order and report the first one that overflows.
    ///
    /// Pages that cannot be measured are skipped for this pass; pages after
    /// the first overflow are not examined.
    pub fn check<M: Measurer + ?Sized>(
        &self,
        doc: &Document,
        measurer: &M,
    ) -> Option<OverflowReport> {
        self.check_from(doc, measurer, 0)
    }

    /// Like [`check`](Self::check), starting at page `first_page`.
    ///
    /// Lets a pass resume the scan after a page it could not act on.
    pub fn check_from<M: Measurer + ?Sized>(
        &self,
        doc: &Document,
        measurer: &M,
        first_page: usize,
    ) -> Option<OverflowReport> {
        let pages = doc.pages().iter().enumerate().skip(first_page);
        for (page_index, page) in pages {
            let Some(content_height) = measurer.content_height(page) else {
                log::trace!("page {} is not measurable, skipping", page_index);
                continue;
            };
            log::trace!(
                "page {}: {} of {} units",
                page_index,
                content_height,
                self.nominal_height
            );
            if content_height <= self.nominal_height {
                continue;
            }

            let children: Option<Vec<MeasuredChild>> = page
                .elements
                .iter()
                .map(|node| {
                    measurer.measure(node).map(|height| MeasuredChild {
                        id: node.id,
                        height,
                    })
                })
                .collect();
            let Some(children) = children else {
                log::trace!("page {} has unmounted children, skipping", page_index);
                continue;
            };

            return Some(OverflowReport {
                page_index,
                children,
                content_height,
                nominal_height: self.nominal_height,
            });
        }
        None
    }
}

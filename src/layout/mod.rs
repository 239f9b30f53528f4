//! Pagination: measuring pages and moving overflow forward.
//!
//! The pieces are layered bottom-up:
//!
//! - [`Measurer`]: rendered heights of content nodes
//! - [`LayoutObserver`]: debounced detection of the first overflowing page
//! - [`ReflowPlanner`]: the split point and the move transaction
//! - [`Paginator`]: the event-driven driver a host polls

mod engine;
mod measure;
mod observer;
mod options;
mod planner;

pub use engine::{
    settle, PaginationStats, Paginator, PassOutcome, SettleReport, SkipReason, DEFAULT_MAX_PASSES,
};
pub use measure::{EstimatingMeasurer, FixedMeasurer, Measurer};
pub use observer::{Debouncer, LayoutObserver, MeasuredChild, OverflowReport};
pub use options::{
    PageNumbering, PageSize, PaginationOptions, DEFAULT_DEBOUNCE_MS, DEFAULT_INITIAL_DELAY_MS,
    DEFAULT_NOMINAL_HEIGHT, UNITS_PER_INCH,
};
pub use planner::{decide_split, MoveTarget, Plan, ReflowMove, ReflowPlanner, SplitDecision};

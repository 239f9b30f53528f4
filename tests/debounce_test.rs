//! Integration tests for debounced measurement passes.

use pageflow::layout::{
    Debouncer, FixedMeasurer, LayoutObserver, PassOutcome, Paginator, PaginationOptions,
};
use pageflow::model::{ContentNode, Document, Page};
use std::time::{Duration, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn small_document() -> Paginator<FixedMeasurer> {
    let doc = Document::from_pages(vec![Page::with_elements(vec![ContentNode::paragraph(
        "start",
    )])]);
    Paginator::new(
        doc,
        FixedMeasurer::new().with_default(100.0),
        PaginationOptions::default(),
    )
}

#[test]
fn test_rapid_edits_coalesce_into_one_pass() {
    let mut paginator = small_document();
    let start = Instant::now();

    // Five edits, 10 ms apart.
    for i in 0..5 {
        let at = paginator.document().page_content_start(0).unwrap();
        paginator
            .insert_content(at, vec![ContentNode::paragraph("typed")], start + ms(i * 10))
            .unwrap();
    }
    let last = start + ms(40);

    // Nothing runs inside the quiet period after the last edit.
    for t in [0, 50, 100, 150, 199] {
        assert_eq!(paginator.poll(last + ms(t)).unwrap(), PassOutcome::Idle);
    }
    assert_eq!(paginator.stats().passes, 0);

    assert_eq!(paginator.poll(last + ms(200)).unwrap(), PassOutcome::Stable);
    assert_eq!(paginator.stats().passes, 1);

    // The deadline was consumed.
    assert_eq!(paginator.poll(last + ms(1_000)).unwrap(), PassOutcome::Idle);
    assert_eq!(paginator.stats().passes, 1);
}

#[test]
fn test_mount_waits_for_initial_delay() {
    let mut paginator = small_document();
    let start = Instant::now();

    paginator.mount(start);

    assert_eq!(paginator.next_deadline(), Some(start + ms(500)));
    assert_eq!(paginator.poll(start + ms(499)).unwrap(), PassOutcome::Idle);
    assert_eq!(paginator.poll(start + ms(500)).unwrap(), PassOutcome::Stable);
}

#[test]
fn test_edit_after_mount_replaces_initial_deadline() {
    let mut paginator = small_document();
    let start = Instant::now();
    paginator.mount(start);

    paginator.on_change(start + ms(100));

    assert_eq!(paginator.next_deadline(), Some(start + ms(300)));
}

#[test]
fn test_custom_debounce_window() {
    let doc = Document::from_pages(vec![Page::new()]);
    let options = PaginationOptions::new().with_debounce(ms(50));
    let mut paginator = Paginator::new(doc, FixedMeasurer::new(), options);
    let start = Instant::now();

    paginator.on_change(start);

    assert_eq!(paginator.poll(start + ms(49)).unwrap(), PassOutcome::Idle);
    assert_eq!(paginator.poll(start + ms(50)).unwrap(), PassOutcome::Stable);
}

#[test]
fn test_observer_owns_its_pending_check() {
    let start = Instant::now();
    let mut observer = LayoutObserver::new(864.0, ms(200));
    assert!(observer.next_deadline().is_none());

    observer.notify_change(start);
    observer.notify_change(start + ms(30));

    assert_eq!(observer.debouncer().deadline(), Some(start + ms(230)));
    assert!(!observer.poll(start + ms(200)));
    assert!(observer.poll(start + ms(230)));
    assert!(!observer.debouncer().is_pending());
}

#[test]
fn test_debouncer_reschedule_after_fire() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(ms(200));

    debouncer.schedule(start);
    assert!(debouncer.fire(start + ms(200)));

    debouncer.schedule(start + ms(300));
    assert_eq!(debouncer.deadline(), Some(start + ms(500)));
    assert!(!debouncer.fire(start + ms(499)));
    assert!(debouncer.fire(start + ms(500)));
}

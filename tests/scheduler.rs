// tests/scheduler.rs

use inkflow::engine::{page_task, InFlightRegistry, Scheduler};
use inkflow::pages::{PageStatus, PageStore};

#[test]
fn sheet_geometry() {
    let scheduler = Scheduler::new(10, 1);

    assert_eq!(scheduler.back_cover_index(), 11);
    assert_eq!(scheduler.max_sheet(), 6);
    assert_eq!(scheduler.upper_bound(0), 0);
    assert_eq!(scheduler.upper_bound(1), 2);
    assert_eq!(scheduler.upper_bound(5), 10);
    assert_eq!(scheduler.upper_bound(6), 11);
    assert_eq!(scheduler.upper_bound(usize::MAX), 11);
    assert_eq!(scheduler.prefetch_bound(), 1);
}

#[test]
fn odd_story_counts_end_on_a_full_sheet() {
    let scheduler = Scheduler::new(9, 1);
    assert_eq!(scheduler.back_cover_index(), 10);
    assert_eq!(scheduler.max_sheet(), 5);
    assert_eq!(scheduler.upper_bound(5), 10);
}

#[test]
fn pass_splits_covers_from_story_pages() {
    let store = PageStore::with_pages(6);
    let registry = InFlightRegistry::new();
    let mut scheduler = Scheduler::new(4, 1);

    let plan = scheduler.plan_pass(&store, &registry, 5);
    assert_eq!(plan.immediate, vec![0, 5]);
    assert_eq!(plan.queued, vec![1, 2, 3, 4]);
    assert_eq!(scheduler.queued(), vec![1, 2, 3, 4]);

    // Queued pages are not planned twice.
    let again = scheduler.plan_pass(&store, &registry, 5);
    assert_eq!(again.queued, Vec::<usize>::new());
    assert_eq!(again.immediate, vec![0, 5]);
}

#[test]
fn empty_pass_changes_nothing() {
    let mut store = PageStore::with_pages(4);
    let mut registry = InFlightRegistry::new();
    let mut scheduler = Scheduler::new(2, 1);

    page_task::start(&mut store, &mut registry, 0).unwrap().unwrap();
    page_task::start(&mut store, &mut registry, 1).unwrap().unwrap();
    let snapshot = store.clone();

    let plan = scheduler.plan_pass(&store, &registry, 1);
    assert!(plan.is_empty());
    assert_eq!(plan.pass_id, 0);
    assert_eq!(store.iter().collect::<Vec<_>>(), snapshot.iter().collect::<Vec<_>>());
}

#[test]
fn story_slot_serializes_in_index_order() {
    let mut store = PageStore::with_pages(6);
    let mut registry = InFlightRegistry::new();
    let mut scheduler = Scheduler::new(4, 1);
    scheduler.plan_pass(&store, &registry, 4);

    let first = scheduler.next_story(&store, &registry).unwrap();
    assert_eq!(first, 1);
    let lease = page_task::start(&mut store, &mut registry, first).unwrap().unwrap();
    scheduler.occupy(lease);

    // Slot busy.
    assert_eq!(scheduler.next_story(&store, &registry), None);
    assert!(!scheduler.is_idle(&registry));

    // Cancelling the active page frees the slot on the next look.
    page_task::cancel(&mut store, &mut registry, 1).unwrap();
    assert_eq!(scheduler.next_story(&store, &registry), Some(2));
}

#[test]
fn queued_pages_that_got_busy_are_skipped() {
    let mut store = PageStore::with_pages(6);
    let mut registry = InFlightRegistry::new();
    let mut scheduler = Scheduler::new(4, 1);
    scheduler.plan_pass(&store, &registry, 3);

    // Page 1 was picked up by a re-ink meanwhile.
    page_task::reink(&mut store, &mut registry, 1).unwrap().unwrap();
    assert_eq!(store.status_of(1), Some(PageStatus::Scripting));

    assert_eq!(scheduler.next_story(&store, &registry), Some(2));
    assert_eq!(scheduler.queued(), vec![3]);
}

#[test]
fn needed_pages_never_pass_the_back_cover() {
    let store = PageStore::with_pages(4);
    let registry = InFlightRegistry::new();
    let scheduler = Scheduler::new(2, 1);

    assert_eq!(scheduler.needed_pages(&store, &registry, 100), vec![0, 1, 2, 3]);
}

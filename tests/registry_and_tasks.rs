// tests/registry_and_tasks.rs

mod common;
use crate::common::builders::{artifact, artifact_for, beat_for};

use inkflow::engine::page_task::{self, Commit};
use inkflow::engine::InFlightRegistry;
use inkflow::errors::GenerationError;
use inkflow::pages::{PageStatus, PageStore};

fn session(pages: usize) -> (PageStore, InFlightRegistry) {
    (PageStore::with_pages(pages), InFlightRegistry::new())
}

#[test]
fn registry_refuses_double_acquire() {
    let mut registry = InFlightRegistry::new();

    let first = registry.try_acquire(3).expect("first acquire");
    assert!(registry.try_acquire(3).is_none());
    assert!(registry.is_current(&first));

    assert!(registry.release(3));
    assert!(!registry.release(3));
    assert!(!registry.is_current(&first));

    let second = registry.try_acquire(3).expect("acquire after release");
    assert!(second.epoch > first.epoch);
    assert!(!registry.release_lease(&first), "stale lease must not release the new holder");
    assert!(registry.contains(3));
}

#[test]
fn epochs_survive_clear() {
    let mut registry = InFlightRegistry::new();
    let before = registry.try_acquire(1).unwrap();
    registry.clear();
    assert!(registry.is_empty());

    let after = registry.try_acquire(1).unwrap();
    assert!(after.epoch > before.epoch);
    assert!(!registry.is_current(&before));
}

#[test]
fn story_task_runs_script_ink_complete() {
    let (mut store, mut registry) = session(5);

    let lease = page_task::start(&mut store, &mut registry, 1).unwrap().unwrap();
    assert_eq!(store.status_of(1), Some(PageStatus::Scripting));
    assert!(registry.contains(1));

    let commit = page_task::commit_beat(&mut store, &registry, &lease, beat_for(1)).unwrap();
    assert_eq!(commit, Commit::Applied);
    assert_eq!(store.status_of(1), Some(PageStatus::Inking));

    let commit = page_task::commit_artwork(&mut store, &mut registry, &lease, artifact_for(1)).unwrap();
    assert_eq!(commit, Commit::Applied);

    let record = store.get(1).unwrap();
    assert_eq!(record.status, PageStatus::Complete);
    assert_eq!(record.beat, Some(beat_for(1)));
    assert_eq!(record.artifact, Some(artifact_for(1)));
    assert!(registry.is_empty());
}

#[test]
fn covers_skip_the_narrative_stage() {
    let (mut store, mut registry) = session(5);

    page_task::start(&mut store, &mut registry, 0).unwrap().unwrap();
    page_task::start(&mut store, &mut registry, 4).unwrap().unwrap();

    assert_eq!(store.status_of(0), Some(PageStatus::Inking));
    assert_eq!(store.status_of(4), Some(PageStatus::Inking));
}

#[test]
fn start_is_refused_for_busy_or_errored_pages() {
    let (mut store, mut registry) = session(5);

    let lease = page_task::start(&mut store, &mut registry, 2).unwrap().unwrap();
    assert!(page_task::start(&mut store, &mut registry, 2).unwrap().is_none());

    page_task::commit_failure(
        &mut store,
        &mut registry,
        &lease,
        &GenerationError::Transport("boom".into()),
    )
    .unwrap();
    assert_eq!(store.status_of(2), Some(PageStatus::Error));
    assert!(page_task::start(&mut store, &mut registry, 2).unwrap().is_none());
    assert!(registry.is_empty());
}

#[test]
fn failure_keeps_partial_beat_and_marks_errored() {
    let (mut store, mut registry) = session(5);

    let lease = page_task::start(&mut store, &mut registry, 1).unwrap().unwrap();
    page_task::commit_beat(&mut store, &registry, &lease, beat_for(1)).unwrap();
    page_task::commit_failure(&mut store, &mut registry, &lease, &GenerationError::MissingImage).unwrap();

    let record = store.get(1).unwrap();
    assert_eq!(record.status, PageStatus::Error);
    assert!(record.errored);
    assert_eq!(record.beat, Some(beat_for(1)));
    assert!(record.artifact.is_none());
}

#[test]
fn cancelled_task_results_are_discarded() {
    let (mut store, mut registry) = session(6);

    let lease = page_task::start(&mut store, &mut registry, 4).unwrap().unwrap();
    page_task::commit_beat(&mut store, &registry, &lease, beat_for(4)).unwrap();

    assert!(page_task::cancel(&mut store, &mut registry, 4).unwrap());
    assert!(!registry.contains(4));
    assert_eq!(store.status_of(4), Some(PageStatus::Error));

    // The renderer finishes anyway.
    let commit = page_task::commit_artwork(&mut store, &mut registry, &lease, artifact_for(4)).unwrap();
    assert_eq!(commit, Commit::Discarded);

    let record = store.get(4).unwrap();
    assert_eq!(record.status, PageStatus::Error);
    assert!(record.artifact.is_none());
}

#[test]
fn cancel_without_active_task_is_a_noop() {
    let (mut store, mut registry) = session(4);
    assert!(!page_task::cancel(&mut store, &mut registry, 1).unwrap());
    assert_eq!(store.status_of(1), Some(PageStatus::Idle));
}

#[test]
fn reink_restarts_an_errored_page_without_its_old_artifact() {
    let (mut store, mut registry) = session(5);

    // Complete the cover, then fail a re-render of it.
    let lease = page_task::start(&mut store, &mut registry, 0).unwrap().unwrap();
    page_task::commit_artwork(&mut store, &mut registry, &lease, artifact("old-cover")).unwrap();
    let lease = page_task::reink(&mut store, &mut registry, 0).unwrap().unwrap();
    assert!(store.get(0).unwrap().artifact.is_none());
    page_task::commit_failure(&mut store, &mut registry, &lease, &GenerationError::MissingImage).unwrap();

    let fresh = page_task::reink(&mut store, &mut registry, 0).unwrap().unwrap();
    assert_eq!(store.status_of(0), Some(PageStatus::Inking));
    assert!(!store.get(0).unwrap().errored);

    page_task::commit_artwork(&mut store, &mut registry, &fresh, artifact("new-cover")).unwrap();
    assert_eq!(store.get(0).unwrap().artifact, Some(artifact("new-cover")));
    assert_eq!(store.status_of(0), Some(PageStatus::Complete));
}

#[test]
fn reink_supersedes_a_running_task() {
    let (mut store, mut registry) = session(5);

    let old = page_task::start(&mut store, &mut registry, 2).unwrap().unwrap();
    let new = page_task::reink(&mut store, &mut registry, 2).unwrap().unwrap();
    assert_ne!(old, new);
    assert_eq!(store.status_of(2), Some(PageStatus::Scripting));

    assert_eq!(
        page_task::commit_beat(&mut store, &registry, &old, beat_for(99)).unwrap(),
        Commit::Discarded
    );
    assert_eq!(
        page_task::commit_beat(&mut store, &registry, &new, beat_for(2)).unwrap(),
        Commit::Applied
    );
    assert_eq!(store.get(2).unwrap().beat, Some(beat_for(2)));
    assert_eq!(registry.pages(), vec![2]);
}

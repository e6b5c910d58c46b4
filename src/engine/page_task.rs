// src/engine/page_task.rs

//! Per-page task state machine.
//!
//! A task runs `idle -> scripting -> inking -> complete` for story pages and
//! `idle -> inking -> complete` for covers, with `error` reachable from either
//! working state. The remote calls happen outside this module; these functions
//! are the synchronous commit points between them.
//!
//! Every commit first checks that the task's [`Lease`] still owns the page. A
//! lease that was released (cancel) or replaced (re-ink) turns the commit into
//! a silent discard: no store write, no status change.

use tracing::{debug, info, warn};

use crate::engine::registry::{InFlightRegistry, Lease};
use crate::errors::GenerationError;
use crate::pages::{PageStatus, PageStore, PageStoreError, PageUpdate};
use crate::types::{Beat, ImageArtifact, PageIndex};

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The store was updated.
    Applied,
    /// The lease no longer owns the page; the result was dropped.
    Discarded,
}

/// Start a task for `page`.
///
/// Returns `None` without touching the store when the page is busy, in
/// `error`, or already held in the registry.
pub fn start(
    store: &mut PageStore,
    registry: &mut InFlightRegistry,
    page: PageIndex,
) -> Result<Option<Lease>, PageStoreError> {
    let record = store.get(page).ok_or(PageStoreError::UnknownPage(page))?;

    if !record.status.accepts_new_task() {
        debug!(page, status = %record.status, "page cannot start a task in this state");
        return Ok(None);
    }

    let first = if record.kind.needs_beat() {
        PageStatus::Scripting
    } else {
        PageStatus::Inking
    };

    // A complete page must pass through idle before working again.
    let reset_first = record.status == PageStatus::Complete;

    let Some(lease) = registry.try_acquire(page) else {
        return Ok(None);
    };

    if reset_first {
        if let Err(err) = store.upsert(page, reset_update()) {
            registry.release_lease(&lease);
            return Err(err);
        }
    }

    if let Err(err) = store.upsert(page, PageUpdate::status(first).errored(false)) {
        registry.release_lease(&lease);
        return Err(err);
    }

    info!(page, epoch = lease.epoch, status = %first, "page task started");
    Ok(Some(lease))
}

/// Commit the beat produced by the narrative generator and move to inking.
pub fn commit_beat(
    store: &mut PageStore,
    registry: &InFlightRegistry,
    lease: &Lease,
    beat: Beat,
) -> Result<Commit, PageStoreError> {
    if !registry.is_current(lease) {
        debug!(page = lease.page, epoch = lease.epoch, "beat arrived for superseded task; discarding");
        return Ok(Commit::Discarded);
    }

    store.upsert(
        lease.page,
        PageUpdate::status(PageStatus::Inking).with_beat(beat),
    )?;
    debug!(page = lease.page, epoch = lease.epoch, "beat committed; inking");
    Ok(Commit::Applied)
}

/// Commit the rendered artwork, complete the page and release its lease.
pub fn commit_artwork(
    store: &mut PageStore,
    registry: &mut InFlightRegistry,
    lease: &Lease,
    artifact: ImageArtifact,
) -> Result<Commit, PageStoreError> {
    if !registry.is_current(lease) {
        debug!(page = lease.page, epoch = lease.epoch, "artwork arrived for superseded task; discarding");
        return Ok(Commit::Discarded);
    }

    let result = store.upsert(
        lease.page,
        PageUpdate::status(PageStatus::Complete).with_artifact(artifact),
    );
    registry.release_lease(lease);
    result?;

    info!(page = lease.page, epoch = lease.epoch, "page complete");
    Ok(Commit::Applied)
}

/// Move the page to `error` and release its lease.
///
/// Partial fields (a beat obtained before an artwork failure) stay in place.
pub fn commit_failure(
    store: &mut PageStore,
    registry: &mut InFlightRegistry,
    lease: &Lease,
    error: &GenerationError,
) -> Result<Commit, PageStoreError> {
    if !registry.is_current(lease) {
        debug!(page = lease.page, epoch = lease.epoch, %error, "failure arrived for superseded task; discarding");
        return Ok(Commit::Discarded);
    }

    let result = store.upsert(
        lease.page,
        PageUpdate::status(PageStatus::Error).errored(true),
    );
    registry.release_lease(lease);
    result?;

    warn!(page = lease.page, epoch = lease.epoch, %error, "page generation failed");
    Ok(Commit::Applied)
}

/// Cooperative cancel: clear membership now and show the page as errored.
///
/// The remote call keeps running; its result is discarded at the next
/// commit. Returns `false` if no task was working on the page.
pub fn cancel(
    store: &mut PageStore,
    registry: &mut InFlightRegistry,
    page: PageIndex,
) -> Result<bool, PageStoreError> {
    let status = store.status_of(page).ok_or(PageStoreError::UnknownPage(page))?;
    let was_held = registry.release(page);

    if !status.is_busy() {
        debug!(page, %status, "cancel requested for page with no active task");
        return Ok(was_held);
    }

    store.upsert(page, PageUpdate::status(PageStatus::Error).errored(true))?;
    info!(page, "page generation cancelled");
    Ok(true)
}

/// Forced regeneration of one page, bypassing the scheduler's skip rule.
///
/// Clears membership (cancelling a running task first), resets the record to
/// `idle` without its previous artifact, then starts a fresh task.
pub fn reink(
    store: &mut PageStore,
    registry: &mut InFlightRegistry,
    page: PageIndex,
) -> Result<Option<Lease>, PageStoreError> {
    let status = store.status_of(page).ok_or(PageStoreError::UnknownPage(page))?;

    if status.is_busy() {
        cancel(store, registry, page)?;
    } else {
        registry.release(page);
    }

    if store.status_of(page) != Some(PageStatus::Idle) {
        store.upsert(page, reset_update())?;
    }

    info!(page, previous = %status, "re-inking page");
    start(store, registry, page)
}

fn reset_update() -> PageUpdate {
    PageUpdate::status(PageStatus::Idle)
        .clear_artifact()
        .errored(false)
}

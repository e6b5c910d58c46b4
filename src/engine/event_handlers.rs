// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::core::SessionState;
use crate::engine::page_task::{self, Commit};
use crate::engine::registry::Lease;
use crate::engine::{GenerationJob, SessionNotice, StageOutcome};
use crate::types::PageIndex;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Run this generation job and report back with `StageFinished`.
    Dispatch(GenerationJob),
    /// Forward this notice to the presentation layer.
    Notify(SessionNotice),
    /// Request that the process exits (batch mode, once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute (dispatch jobs, notify, exit).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    /// Jobs among the commands, in dispatch order.
    pub fn jobs(&self) -> Vec<&GenerationJob> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Dispatch(job) => Some(job),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<&SessionNotice> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Notify(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

/// Create every record and run the prefetch pass: the cover plus the first
/// `prefetch_story_pages` story pages.
pub(crate) fn handle_launch(state: &mut SessionState) -> Vec<CoreCommand> {
    if state.launched {
        warn!("session already launched; ignoring launch");
        return Vec::new();
    }

    let page_count = state.config.story.page_count();
    state.store.initialize(page_count);
    state.scheduler.reset();
    state.viewport = 0;
    state.launched = true;
    info!(pages = page_count, "session launched");

    let mut commands = vec![CoreCommand::Notify(SessionNotice::Launched { pages: page_count })];
    let bound = state.scheduler.prefetch_bound();
    commands.extend(run_pass(state, bound));
    commands
}

/// The reader turned to `sheet`: schedule everything up to its upper bound.
pub(crate) fn handle_viewport(state: &mut SessionState, sheet: usize) -> Vec<CoreCommand> {
    if !state.launched {
        warn!(sheet, "viewport change before launch; ignoring");
        return Vec::new();
    }

    let sheet = sheet.min(state.scheduler.max_sheet());
    state.viewport = sheet;
    let bound = state.scheduler.upper_bound(sheet);
    debug!(sheet, bound, "viewport changed");
    run_pass(state, bound)
}

pub(crate) fn handle_reink(state: &mut SessionState, page: PageIndex) -> Vec<CoreCommand> {
    if !state.launched {
        warn!(page, "re-ink before launch; ignoring");
        return Vec::new();
    }

    // A re-inked slot page keeps the slot, so later story pages still wait
    // for its beat.
    let holds_slot = state
        .scheduler
        .active_story()
        .is_some_and(|active| active.page == page && state.registry.is_current(&active));

    match page_task::reink(&mut state.store, &mut state.registry, page) {
        Ok(Some(lease)) => {
            if holds_slot {
                state.scheduler.occupy(lease);
            }
            state
                .first_job(lease)
                .map(CoreCommand::Dispatch)
                .into_iter()
                .collect()
        }
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(page, error = %err, "re-ink rejected");
            Vec::new()
        }
    }
}

pub(crate) fn handle_cancel(state: &mut SessionState, page: PageIndex) -> Vec<CoreCommand> {
    if !state.launched {
        warn!(page, "cancel before launch; ignoring");
        return Vec::new();
    }

    if let Err(err) = page_task::cancel(&mut state.store, &mut state.registry, page) {
        warn!(page, error = %err, "cancel rejected");
    }
    Vec::new()
}

/// Apply the result of one generation stage through the page task state
/// machine.
pub(crate) fn handle_stage_finished(
    state: &mut SessionState,
    lease: Lease,
    outcome: StageOutcome,
) -> Vec<CoreCommand> {
    let mut commands = Vec::new();

    let result = match outcome {
        StageOutcome::Scripted(beat) => {
            match page_task::commit_beat(&mut state.store, &state.registry, &lease, beat.clone()) {
                Ok(Commit::Applied) => {
                    commands.push(CoreCommand::Dispatch(state.panel_job(lease, beat)));
                    Ok(())
                }
                Ok(Commit::Discarded) => Ok(()),
                Err(err) => Err(err),
            }
        }
        StageOutcome::Inked(artifact) => {
            page_task::commit_artwork(&mut state.store, &mut state.registry, &lease, artifact)
                .map(|_| ())
        }
        StageOutcome::Failed(error) => {
            if error.is_auth() {
                // The credential is global: the notice goes out even when the
                // page itself was cancelled in the meantime.
                commands.push(CoreCommand::Notify(SessionNotice::CredentialsRejected {
                    page: Some(lease.page),
                    message: error.to_string(),
                }));
            }
            page_task::commit_failure(&mut state.store, &mut state.registry, &lease, &error)
                .map(|_| ())
        }
    };

    if let Err(err) = result {
        // The store refused the write; keep the registry consistent with it.
        warn!(page = lease.page, epoch = lease.epoch, error = %err, "stage result rejected by page store");
        let owned = state.registry.is_current(&lease) || !state.registry.contains(lease.page);
        if owned {
            if let Err(err) = page_task::cancel(&mut state.store, &mut state.registry, lease.page) {
                warn!(page = lease.page, error = %err, "could not mark page as errored");
            }
        }
    }

    commands
}

/// Drop the session: every record, every lease, every queued page.
pub(crate) fn handle_reset(state: &mut SessionState) -> Vec<CoreCommand> {
    if !state.launched {
        debug!("reset before launch; nothing to drop");
        return Vec::new();
    }

    let abandoned = state.registry.pages();
    state.registry.clear();
    state.scheduler.reset();
    state.store = Default::default();
    state.viewport = 0;
    state.launched = false;
    info!(?abandoned, "session reset");

    vec![CoreCommand::Notify(SessionNotice::Reset)]
}

/// Plan one pass and start its cover pages. Story pages wait in the
/// scheduler queue for [`pump_story_slot`].
fn run_pass(state: &mut SessionState, bound: PageIndex) -> Vec<CoreCommand> {
    let plan = state.scheduler.plan_pass(&state.store, &state.registry, bound);
    if plan.is_empty() {
        return Vec::new();
    }

    let mut commands = Vec::new();
    for page in plan.immediate {
        match page_task::start(&mut state.store, &mut state.registry, page) {
            Ok(Some(lease)) => {
                if let Some(job) = state.first_job(lease) {
                    commands.push(CoreCommand::Dispatch(job));
                }
            }
            Ok(None) => debug!(page, pass = plan.pass_id, "page skipped by task start"),
            Err(err) => warn!(page, pass = plan.pass_id, error = %err, "could not start page task"),
        }
    }
    commands
}

/// Start the next queued story page if the scheduler's story slot is free.
///
/// Pages that refuse to start are skipped so a single bad record never
/// stalls the queue.
pub(crate) fn pump_story_slot(state: &mut SessionState) -> Vec<CoreCommand> {
    while let Some(page) = state.scheduler.next_story(&state.store, &state.registry) {
        match page_task::start(&mut state.store, &mut state.registry, page) {
            Ok(Some(lease)) => {
                state.scheduler.occupy(lease);
                return state
                    .first_job(lease)
                    .map(CoreCommand::Dispatch)
                    .into_iter()
                    .collect();
            }
            Ok(None) => debug!(page, "queued story page could not start; skipping"),
            Err(err) => warn!(page, error = %err, "could not start queued story page"),
        }
    }
    Vec::new()
}

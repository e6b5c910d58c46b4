#![allow(dead_code)]

//! Helpers for driving a `CoreRuntime` by hand, without Tokio.

use std::collections::VecDeque;

use inkflow::engine::{
    CoreCommand, CoreRuntime, CoreStep, GenerationJob, RuntimeEvent, SessionNotice, StageOutcome,
};
use inkflow::errors::GenerationError;
use inkflow::types::PageIndex;

use crate::builders::{artifact_for, beat_for};

/// Successful outcome for `job`: `beat_for(page)` or `artifact_for(page)`.
pub fn success_outcome(job: &GenerationJob) -> StageOutcome {
    let page = job.lease().page;
    match job {
        GenerationJob::Script { .. } => StageOutcome::Scripted(beat_for(page)),
        GenerationJob::Ink { .. } => StageOutcome::Inked(artifact_for(page)),
    }
}

pub fn succeed(job: &GenerationJob) -> RuntimeEvent {
    RuntimeEvent::StageFinished {
        lease: job.lease(),
        outcome: success_outcome(job),
    }
}

pub fn fail(job: &GenerationJob, error: GenerationError) -> RuntimeEvent {
    RuntimeEvent::StageFinished {
        lease: job.lease(),
        outcome: StageOutcome::Failed(error),
    }
}

pub fn jobs_of(step: &CoreStep) -> Vec<GenerationJob> {
    step.jobs().into_iter().cloned().collect()
}

pub fn notices_of(step: &CoreStep) -> Vec<SessionNotice> {
    step.notices().into_iter().cloned().collect()
}

pub fn requested_exit(step: &CoreStep) -> bool {
    step.commands
        .iter()
        .any(|c| matches!(c, CoreCommand::RequestExit))
}

/// `(page, stage)` pairs of a step's jobs, e.g. `[(0, "ink"), (1, "script")]`.
pub fn job_pages(step: &CoreStep) -> Vec<(PageIndex, &'static str)> {
    step.jobs()
        .into_iter()
        .map(|j| (j.lease().page, j.stage()))
        .collect()
}

/// Complete every outstanding job (and every job they lead to) successfully,
/// in FIFO order. Returns the jobs in the order they were completed.
pub fn run_until_quiet(core: &mut CoreRuntime, pending: Vec<GenerationJob>) -> Vec<GenerationJob> {
    let mut queue: VecDeque<GenerationJob> = pending.into();
    let mut done = Vec::new();

    while let Some(job) = queue.pop_front() {
        let step = core.step(succeed(&job));
        queue.extend(jobs_of(&step));
        done.push(job);
    }

    done
}

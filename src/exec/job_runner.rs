// src/exec/job_runner.rs

//! Individual generation job runner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{GenerationJob, RuntimeEvent, StageOutcome};
use crate::errors::GenerationError;
use crate::exec::collaborators::{ArtworkRenderer, NarrativeGenerator};

/// Run a single job against its collaborator and report the outcome.
///
/// The job is never aborted from the outside: a cancelled page's job runs to
/// completion and the core discards its result at the commit check.
pub async fn run_job(
    job: GenerationJob,
    narrator: Arc<dyn NarrativeGenerator>,
    renderer: Arc<dyn ArtworkRenderer>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    timeout: Duration,
) {
    let lease = job.lease();
    let stage = job.stage();
    info!(page = lease.page, epoch = lease.epoch, stage, "generation job started");

    let outcome = match job {
        GenerationJob::Script { request, .. } => {
            match tokio::time::timeout(timeout, narrator.generate(request)).await {
                Ok(Ok(beat)) => StageOutcome::Scripted(beat),
                Ok(Err(err)) => StageOutcome::Failed(err),
                Err(_) => StageOutcome::Failed(GenerationError::Timeout(timeout)),
            }
        }
        GenerationJob::Ink { request, .. } => {
            match tokio::time::timeout(timeout, renderer.render(request)).await {
                Ok(Ok(artifact)) => StageOutcome::Inked(artifact),
                Ok(Err(err)) => StageOutcome::Failed(err),
                Err(_) => StageOutcome::Failed(GenerationError::Timeout(timeout)),
            }
        }
    };

    match &outcome {
        StageOutcome::Failed(err) => {
            warn!(page = lease.page, epoch = lease.epoch, stage, error = %err, "generation job failed")
        }
        _ => debug!(page = lease.page, epoch = lease.epoch, stage, "generation job finished"),
    }

    if runtime_tx
        .send(RuntimeEvent::StageFinished { lease, outcome })
        .await
        .is_err()
    {
        debug!(page = lease.page, stage, "runtime gone; dropping job result");
    }
}

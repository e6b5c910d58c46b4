// src/exec/backend.rs

//! Pluggable generation backend abstraction.
//!
//! The runtime talks to a `GenerationBackend` instead of calling the
//! collaborators itself. This makes it easy to swap in a fake backend in tests
//! while keeping the production implementation here.
//!
//! - `CollaboratorBackend` is the default implementation. It spawns one Tokio
//!   task per job which awaits the narrative generator or artwork renderer
//!   and reports a `StageFinished` event back to the runtime.
//! - Tests can provide their own `GenerationBackend` that, for example,
//!   records which jobs were dispatched and finishes them on demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{GenerationJob, RuntimeEvent};
use crate::errors::Result;
use crate::exec::collaborators::{ArtworkRenderer, AuthProbe, NarrativeGenerator};
use crate::exec::job_runner::run_job;

/// Trait abstracting how generation jobs are executed.
pub trait GenerationBackend: Send {
    /// Start the given job. Completion is reported asynchronously as a
    /// `RuntimeEvent::StageFinished`.
    fn dispatch(
        &mut self,
        job: GenerationJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Check the current credential before the premium image model is used.
    fn probe_credentials(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Production backend wired to real collaborators.
pub struct CollaboratorBackend {
    narrator: Arc<dyn NarrativeGenerator>,
    renderer: Arc<dyn ArtworkRenderer>,
    probe: Arc<dyn AuthProbe>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    timeout: Duration,
}

impl CollaboratorBackend {
    pub fn new(
        narrator: Arc<dyn NarrativeGenerator>,
        renderer: Arc<dyn ArtworkRenderer>,
        probe: Arc<dyn AuthProbe>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        timeout: Duration,
    ) -> Self {
        Self {
            narrator,
            renderer,
            probe,
            runtime_tx,
            timeout,
        }
    }
}

impl GenerationBackend for CollaboratorBackend {
    fn dispatch(
        &mut self,
        job: GenerationJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone everything the job needs so the spawned task owns it.
        let narrator = Arc::clone(&self.narrator);
        let renderer = Arc::clone(&self.renderer);
        let tx = self.runtime_tx.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let lease = job.lease();
            debug!(page = lease.page, epoch = lease.epoch, stage = job.stage(), "spawning generation job");
            tokio::spawn(run_job(job, narrator, renderer, tx, timeout));
            Ok(())
        })
    }

    fn probe_credentials(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let probe = Arc::clone(&self.probe);
        Box::pin(async move { probe.probe().await })
    }
}

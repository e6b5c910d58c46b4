// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{InkflowError, Result};
use crate::exec::GenerationBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, GenerationJob, RuntimeEvent, SessionNotice};

const PROBE_REJECTED: &str = "the selected API key cannot use the premium image model";

/// Drives the page orchestrator in response to `RuntimeEvent`s, and delegates
/// actual generation work to a `GenerationBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// session semantics. This struct handles async IO: reading events from
/// channels, dispatching jobs, forwarding notices and running the
/// credential probe before a premium launch.
pub struct Runtime<B: GenerationBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    notice_tx: Option<mpsc::Sender<SessionNotice>>,
}

impl<B: GenerationBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: GenerationBackend> Runtime<B> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
            notice_tx: None,
        }
    }

    /// Forward every `SessionNotice` to `tx`.
    pub fn with_notices(mut self, tx: mpsc::Sender<SessionNotice>) -> Self {
        self.notice_tx = Some(tx);
        self
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (dispatch jobs, notify, exit).
    ///
    /// Returns the core so the caller can export whatever was completed.
    pub async fn run(mut self) -> Result<CoreRuntime> {
        info!("inkflow runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            if matches!(event, RuntimeEvent::Launch) && !self.launch_allowed().await? {
                continue;
            }

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!(ready = self.core.store().ready_count(), "runtime exiting");
        Ok(self.core)
    }

    /// Run the credential probe before a premium launch.
    ///
    /// A rejected launch is dropped; in batch mode there is nobody to pick a
    /// new key, so the run ends with an error instead.
    async fn launch_allowed(&mut self) -> Result<bool> {
        if self.core.is_launched() || !self.core.config().render.is_premium() {
            return Ok(true);
        }

        debug!(model = %self.core.config().render.image_model, "probing credentials before premium launch");
        if self.backend.probe_credentials().await {
            return Ok(true);
        }

        warn!("credential probe rejected; launch dropped");
        self.notify(SessionNotice::CredentialsRejected {
            page: None,
            message: PROBE_REJECTED.to_string(),
        })
        .await;

        if self.core.config().options.exit_when_idle {
            return Err(InkflowError::CredentialsRejected(PROBE_REJECTED.to_string()));
        }
        Ok(false)
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Dispatch(job) => self.dispatch(job).await?,
            CoreCommand::Notify(notice) => self.notify(notice).await,
            CoreCommand::RequestExit => {
                // keep_running is already false; nothing else to do.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, job: GenerationJob) -> Result<()> {
        let lease = job.lease();
        debug!(page = lease.page, epoch = lease.epoch, stage = job.stage(), "dispatching job");
        self.backend.dispatch(job).await
    }

    async fn notify(&self, notice: SessionNotice) {
        let Some(tx) = &self.notice_tx else {
            return;
        };
        if tx.send(notice).await.is_err() {
            debug!("notice receiver dropped");
        }
    }
}

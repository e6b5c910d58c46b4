use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use inkflow::engine::{GenerationJob, RuntimeEvent};
use inkflow::errors::Result;
use inkflow::exec::GenerationBackend;
use inkflow::types::PageIndex;

use crate::harness::success_outcome;

/// A fake backend that:
/// - records which jobs were dispatched, as `(page, stage)`
/// - immediately reports a successful `StageFinished` for each job.
pub struct RecordingBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<(PageIndex, &'static str)>>>,
    probe_ok: bool,
}

impl RecordingBackend {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<(PageIndex, &'static str)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            probe_ok: true,
        }
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.probe_ok = false;
        self
    }
}

impl GenerationBackend for RecordingBackend {
    fn dispatch(
        &mut self,
        job: GenerationJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);

        Box::pin(async move {
            {
                let mut guard = dispatched.lock().unwrap();
                guard.push((job.lease().page, job.stage()));
            }

            tx.send(RuntimeEvent::StageFinished {
                lease: job.lease(),
                outcome: success_outcome(&job),
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }

    fn probe_credentials(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let ok = self.probe_ok;
        Box::pin(async move { ok })
    }
}

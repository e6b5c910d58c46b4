use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use inkflow::errors::GenerationError;
use inkflow::exec::{
    ArtworkRenderer, ArtworkRequest, AuthProbe, BoxFuture, NarrativeGenerator, NarrativeRequest,
};
use inkflow::types::{Beat, ImageArtifact, PageIndex};

use crate::builders::{artifact_for, beat_for};

#[derive(Default)]
struct StudioState {
    scripts: Mutex<Vec<NarrativeRequest>>,
    renders: Mutex<Vec<ArtworkRequest>>,
    script_failures: Mutex<HashMap<PageIndex, GenerationError>>,
    ink_failures: Mutex<HashMap<PageIndex, GenerationError>>,
    script_gates: Mutex<HashMap<PageIndex, Arc<Notify>>>,
    probe_rejects: AtomicBool,
    probes: AtomicUsize,
}

/// Scripted stand-in for the narrative generator, the artwork renderer and
/// the credential probe.
///
/// - records every request it receives
/// - answers with `beat_for(page)` / `artifact_for(page)` by default
/// - can fail a given page's script or ink stage
/// - can hold a page's script call until the test releases it
#[derive(Clone, Default)]
pub struct FakeStudio {
    state: Arc<StudioState>,
}

impl FakeStudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_script(&self, page: PageIndex, error: GenerationError) {
        self.state.script_failures.lock().unwrap().insert(page, error);
    }

    pub fn fail_ink(&self, page: PageIndex, error: GenerationError) {
        self.state.ink_failures.lock().unwrap().insert(page, error);
    }

    /// Block the script call for `page` until `notify_one()` is called on the
    /// returned handle.
    pub fn hold_script(&self, page: PageIndex) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .script_gates
            .lock()
            .unwrap()
            .insert(page, Arc::clone(&gate));
        gate
    }

    pub fn reject_credentials(&self) {
        self.state.probe_rejects.store(true, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn script_requests(&self) -> Vec<NarrativeRequest> {
        self.state.scripts.lock().unwrap().clone()
    }

    pub fn render_requests(&self) -> Vec<ArtworkRequest> {
        self.state.renders.lock().unwrap().clone()
    }

    /// Pages in the order their script calls arrived.
    pub fn scripted_pages(&self) -> Vec<PageIndex> {
        self.script_requests().iter().map(|r| r.page).collect()
    }
}

impl NarrativeGenerator for FakeStudio {
    fn generate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Beat, GenerationError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let page = request.page;
            state.scripts.lock().unwrap().push(request);

            let gate = state.script_gates.lock().unwrap().get(&page).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            match state.script_failures.lock().unwrap().get(&page) {
                Some(err) => Err(err.clone()),
                None => Ok(beat_for(page)),
            }
        })
    }
}

impl ArtworkRenderer for FakeStudio {
    fn render(&self, request: ArtworkRequest) -> BoxFuture<'_, Result<ImageArtifact, GenerationError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let page = request.page;
            state.renders.lock().unwrap().push(request);

            match state.ink_failures.lock().unwrap().get(&page) {
                Some(err) => Err(err.clone()),
                None => Ok(artifact_for(page)),
            }
        })
    }
}

impl AuthProbe for FakeStudio {
    fn probe(&self) -> BoxFuture<'_, bool> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            state.probes.fetch_add(1, Ordering::SeqCst);
            !state.probe_rejects.load(Ordering::SeqCst)
        })
    }
}

// src/engine/mod.rs

//! Page generation orchestrator.
//!
//! This module ties together:
//! - the in-flight registry (who owns which page right now)
//! - the per-page task state machine
//! - the viewport-driven scheduler
//! - the main runtime event loop that reacts to:
//!   - launch / viewport / re-ink / cancel commands from the reader
//!   - finished generation stages reported by the backend
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::errors::GenerationError;
use crate::exec::collaborators::{ArtworkRequest, NarrativeRequest};
use crate::pages::PageStatus;
use crate::types::{Beat, ImageArtifact, PageIndex};

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once the session is launched, nothing is in
    /// flight and nothing is queued (batch mode).
    pub exit_when_idle: bool,
}

/// What one finished generation stage produced.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Scripted(Beat),
    Inked(ImageArtifact),
    Failed(GenerationError),
}

/// Events flowing into the runtime from the reader, the backend, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Create every page record and run the prefetch pass.
    Launch,
    /// The reader turned to `sheet`.
    ViewportChanged { sheet: usize },
    /// Forced regeneration of one page.
    Reink { page: PageIndex },
    /// Stop waiting for one page.
    Cancel { page: PageIndex },
    /// A generation job finished (or failed) for the given lease.
    StageFinished { lease: Lease, outcome: StageOutcome },
    /// Drop the session and return to the not-launched state.
    Reset,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Remote work the IO shell must run on behalf of one page task.
#[derive(Debug, Clone)]
pub enum GenerationJob {
    Script {
        lease: Lease,
        request: NarrativeRequest,
    },
    Ink {
        lease: Lease,
        request: ArtworkRequest,
    },
}

impl GenerationJob {
    pub fn lease(&self) -> Lease {
        match self {
            GenerationJob::Script { lease, .. } | GenerationJob::Ink { lease, .. } => *lease,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            GenerationJob::Script { .. } => "script",
            GenerationJob::Ink { .. } => "ink",
        }
    }
}

/// Outward-facing session updates for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Launched { pages: usize },
    PageChanged { page: PageIndex, status: PageStatus },
    /// The remote service refused the credential; the reader must pick a new
    /// key before generation can succeed.
    CredentialsRejected {
        page: Option<PageIndex>,
        message: String,
    },
    /// Launched, nothing in flight, nothing queued.
    Idle,
    Reset,
}

pub mod core;
pub mod event_handlers;
pub mod page_task;
pub mod registry;
pub mod runtime;
pub mod scheduler;

pub use core::{CoreRuntime, SessionConfig};
pub use event_handlers::{CoreCommand, CoreStep};
pub use page_task::Commit;
pub use registry::{InFlightRegistry, Lease};
pub use runtime::Runtime;
pub use scheduler::{PassPlan, Scheduler};

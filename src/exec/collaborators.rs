// src/exec/collaborators.rs

//! Boundary traits for the remote generation services.
//!
//! The orchestrator never talks to a model directly: it builds a request,
//! hands it to one of these traits from a spawned job, and applies whatever
//! comes back through the page task state machine. Production uses
//! [`crate::exec::gemini::GeminiClient`]; tests plug in scripted fakes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::GenerationError;
use crate::pages::HistoryLog;
use crate::types::{Beat, ImageArtifact, PageIndex, PersonaReference, StyleContext, Verbosity};

/// Boxed future returned by collaborator methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything the narrative generator needs to script one story page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRequest {
    pub page: PageIndex,
    pub story_pages: usize,
    pub title: String,
    pub language: String,
    pub genre: String,
    pub tone: String,
    pub premise: String,
    pub verbosity: Verbosity,
    pub hero_name: Option<String>,
    pub friend_name: Option<String>,
    /// Beats of every story page with index `< page`, ascending.
    pub history: HistoryLog,
}

/// What the artwork should depict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSubject {
    Cover {
        title: String,
        genre: String,
        hero_name: Option<String>,
    },
    BackCover {
        hero_name: Option<String>,
    },
    Panel {
        beat: Beat,
        /// Display name of the beat's focus character.
        focus_name: String,
    },
}

/// Everything the renderer needs to draw one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRequest {
    pub page: PageIndex,
    /// Hero first, then the sidekick; at most two.
    pub references: Vec<Arc<PersonaReference>>,
    pub style: StyleContext,
    pub aspect_ratio: String,
    pub image_size: Option<String>,
    pub subject: ArtworkSubject,
}

/// Turns (page, history, story configuration) into a structured beat.
pub trait NarrativeGenerator: Send + Sync {
    fn generate(&self, request: NarrativeRequest) -> BoxFuture<'_, Result<Beat, GenerationError>>;
}

/// Turns a beat or cover directive plus references into an image.
pub trait ArtworkRenderer: Send + Sync {
    fn render(&self, request: ArtworkRequest) -> BoxFuture<'_, Result<ImageArtifact, GenerationError>>;
}

/// Checks the current credential before a premium rendering configuration
/// is used.
pub trait AuthProbe: Send + Sync {
    fn probe(&self) -> BoxFuture<'_, bool>;
}

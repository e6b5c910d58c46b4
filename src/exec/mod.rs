// src/exec/mod.rs

//! Generation execution layer.
//!
//! This module is responsible for actually running the remote generation
//! calls and reporting back to the orchestration runtime via
//! `RuntimeEvent`s.
//!
//! - [`collaborators`] defines the narrative, artwork and credential traits.
//! - [`backend`] provides the `GenerationBackend` trait and the production
//!   `CollaboratorBackend`, which tests can replace with a fake.
//! - [`job_runner`] runs one job with a timeout and reports its outcome.
//! - [`gemini`] is the concrete REST adapter, with its prompts in
//!   [`prompts`] and hero analysis parsing in [`analysis`].

pub mod analysis;
pub mod backend;
pub mod collaborators;
pub mod gemini;
pub mod job_runner;
pub mod prompts;

pub use analysis::{parse_analysis, HeroAnalysis};
pub use backend::{CollaboratorBackend, GenerationBackend};
pub use collaborators::{
    ArtworkRenderer, ArtworkRequest, ArtworkSubject, AuthProbe, BoxFuture, NarrativeGenerator,
    NarrativeRequest,
};
pub use gemini::GeminiClient;

// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated session state (page store, registry, scheduler, viewport)
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, running generation jobs and forwarding notices.
//! The core has no Tokio types, no channels and performs no IO, so every
//! scheduling scenario can be replayed step by step in tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigFile, RenderSettings, StorySettings};
use crate::engine::event_handlers::{
    handle_cancel, handle_launch, handle_reink, handle_reset, handle_stage_finished,
    handle_viewport, pump_story_slot, CoreCommand, CoreStep,
};
use crate::engine::registry::{InFlightRegistry, Lease};
use crate::engine::scheduler::Scheduler;
use crate::engine::{GenerationJob, RuntimeEvent, RuntimeOptions, SessionNotice};
use crate::exec::collaborators::{ArtworkRequest, ArtworkSubject, NarrativeRequest};
use crate::pages::{HistoryLog, PageStatus, PageStore};
use crate::types::{Beat, FocusCharacter, PageIndex, PageKind, PersonaReference, StyleContext};

/// Immutable inputs of one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub story: StorySettings,
    pub render: RenderSettings,
    pub hero_name: Option<String>,
    pub friend_name: Option<String>,
    /// Hero first, then the sidekick.
    pub references: Vec<Arc<PersonaReference>>,
    pub style: StyleContext,
    pub prefetch_story_pages: usize,
    pub options: RuntimeOptions,
}

impl SessionConfig {
    /// Defaults for everything except the story and render settings.
    pub fn new(story: StorySettings, render: RenderSettings) -> Self {
        let style = StyleContext::resolve(render.style.as_deref(), None, &story.genre);
        Self {
            story,
            render,
            hero_name: None,
            friend_name: None,
            references: Vec::new(),
            style,
            prefetch_story_pages: 1,
            options: RuntimeOptions::default(),
        }
    }

    /// Build from a validated config file plus whatever was resolved before
    /// launch (uploaded references, analysed style).
    pub fn from_config(
        cfg: &ConfigFile,
        references: Vec<Arc<PersonaReference>>,
        style: StyleContext,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            story: cfg.story.clone(),
            render: cfg.render.clone(),
            hero_name: Some(cfg.hero.name.clone()),
            friend_name: cfg.friend.as_ref().map(|f| f.name.clone()),
            references,
            style,
            prefetch_story_pages: cfg.session.prefetch_story_pages,
            options,
        }
    }

    fn focus_name(&self, focus: FocusCharacter) -> String {
        match focus {
            FocusCharacter::Hero => self
                .hero_name
                .clone()
                .unwrap_or_else(|| "the hero".to_string()),
            FocusCharacter::Friend => self
                .friend_name
                .clone()
                .unwrap_or_else(|| "the sidekick".to_string()),
            FocusCharacter::Other => "someone".to_string(),
        }
    }
}

/// Mutable session state shared by the event handlers.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) config: SessionConfig,
    pub(crate) store: PageStore,
    pub(crate) registry: InFlightRegistry,
    pub(crate) scheduler: Scheduler,
    pub(crate) viewport: usize,
    pub(crate) launched: bool,
}

impl SessionState {
    fn new(config: SessionConfig) -> Self {
        let scheduler = Scheduler::new(config.story.story_pages, config.prefetch_story_pages);
        Self {
            config,
            store: PageStore::default(),
            registry: InFlightRegistry::new(),
            scheduler,
            viewport: 0,
            launched: false,
        }
    }

    /// First job of a freshly started task: a script job for story pages,
    /// an ink job for covers.
    pub(crate) fn first_job(&self, lease: Lease) -> Option<GenerationJob> {
        match self.store.status_of(lease.page)? {
            PageStatus::Scripting => Some(GenerationJob::Script {
                lease,
                request: self.narrative_request(lease.page),
            }),
            PageStatus::Inking => {
                let kind = self.store.get(lease.page)?.kind;
                let subject = self.cover_subject(kind)?;
                Some(GenerationJob::Ink {
                    lease,
                    request: self.artwork_request(lease.page, subject),
                })
            }
            _ => None,
        }
    }

    /// Ink job for a story page whose beat was just committed.
    pub(crate) fn panel_job(&self, lease: Lease, beat: Beat) -> GenerationJob {
        let focus_name = self.config.focus_name(beat.focus);
        GenerationJob::Ink {
            lease,
            request: self.artwork_request(lease.page, ArtworkSubject::Panel { beat, focus_name }),
        }
    }

    fn narrative_request(&self, page: PageIndex) -> NarrativeRequest {
        let story = &self.config.story;
        NarrativeRequest {
            page,
            story_pages: story.story_pages,
            title: story.title.clone(),
            language: story.language_name.clone(),
            genre: story.genre.clone(),
            tone: story.tone.clone(),
            premise: story.premise_or_default().to_string(),
            verbosity: story.verbosity,
            hero_name: self.config.hero_name.clone(),
            friend_name: self.config.friend_name.clone(),
            history: HistoryLog::before(&self.store, page),
        }
    }

    fn cover_subject(&self, kind: PageKind) -> Option<ArtworkSubject> {
        let hero_name = self.config.hero_name.clone();
        match kind {
            PageKind::Cover => Some(ArtworkSubject::Cover {
                title: self.config.story.title.clone(),
                genre: self.config.story.genre.clone(),
                hero_name,
            }),
            PageKind::BackCover => Some(ArtworkSubject::BackCover { hero_name }),
            PageKind::Story => None,
        }
    }

    fn artwork_request(&self, page: PageIndex, subject: ArtworkSubject) -> ArtworkRequest {
        let render = &self.config.render;
        ArtworkRequest {
            page,
            references: self.config.references.clone(),
            style: self.config.style.clone(),
            aspect_ratio: render.aspect_ratio.clone(),
            image_size: render.effective_image_size().map(str::to_string),
            subject,
        }
    }

    /// Launched, nothing held, nothing queued.
    pub(crate) fn is_idle(&self) -> bool {
        self.launched && self.registry.is_empty() && self.scheduler.is_idle(&self.registry)
    }

    fn statuses(&self) -> BTreeMap<PageIndex, PageStatus> {
        self.store.iter().map(|r| (r.index, r.status)).collect()
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    state: SessionState,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(config: SessionConfig) -> Self {
        let options = config.options;
        Self {
            state: SessionState::new(config),
            options,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.state.config
    }

    pub fn store(&self) -> &PageStore {
        &self.state.store
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.state.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.state.scheduler
    }

    pub fn viewport(&self) -> usize {
        self.state.viewport
    }

    pub fn is_launched(&self) -> bool {
        self.state.launched
    }

    /// Launched, nothing in flight and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Narrative context a story task for `page` would be given right now.
    pub fn history_for(&self, page: PageIndex) -> HistoryLog {
        HistoryLog::before(&self.state.store, page)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        if matches!(event, RuntimeEvent::ShutdownRequested) {
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        let was_idle = self.state.is_idle();
        let before = self.state.statuses();

        let mut commands = match event {
            RuntimeEvent::Launch => handle_launch(&mut self.state),
            RuntimeEvent::ViewportChanged { sheet } => handle_viewport(&mut self.state, sheet),
            RuntimeEvent::Reink { page } => handle_reink(&mut self.state, page),
            RuntimeEvent::Cancel { page } => handle_cancel(&mut self.state, page),
            RuntimeEvent::StageFinished { lease, outcome } => {
                handle_stage_finished(&mut self.state, lease, outcome)
            }
            RuntimeEvent::Reset => handle_reset(&mut self.state),
            RuntimeEvent::ShutdownRequested => Vec::new(),
        };

        if self.state.launched {
            commands.extend(pump_story_slot(&mut self.state));
        }

        for record in self.state.store.iter() {
            if before.get(&record.index) != Some(&record.status) {
                commands.push(CoreCommand::Notify(SessionNotice::PageChanged {
                    page: record.index,
                    status: record.status,
                }));
            }
        }

        let mut keep_running = true;
        if self.state.is_idle() {
            if !was_idle {
                debug!(ready = self.state.store.ready_count(), "session idle");
                commands.push(CoreCommand::Notify(SessionNotice::Idle));
            }
            if self.options.exit_when_idle {
                keep_running = false;
                commands.push(CoreCommand::RequestExit);
            }
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}

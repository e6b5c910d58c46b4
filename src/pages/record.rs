// src/pages/record.rs

//! A single page's record and its status state machine.

use std::fmt;

use crate::types::{Beat, ImageArtifact, PageIndex, PageKind};

/// Generation status of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageStatus {
    /// Nothing running; waiting for the scheduler or a re-ink.
    Idle,
    /// Narrative beat requested from the generator.
    Scripting,
    /// Artwork requested from the renderer.
    Inking,
    /// Artifact present; may be re-inked.
    Complete,
    /// Failed or cancelled; terminal until re-ink.
    Error,
}

impl PageStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: PageStatus) -> bool {
        use PageStatus::*;
        matches!(
            (self, next),
            (Idle, Scripting)
                | (Idle, Inking)
                | (Scripting, Inking)
                | (Scripting, Error)
                | (Inking, Complete)
                | (Inking, Error)
                | (Error, Idle)
                | (Complete, Idle)
        )
    }

    /// `Idle` and `Complete` are the only states a new task may start from.
    pub fn accepts_new_task(self) -> bool {
        matches!(self, PageStatus::Idle | PageStatus::Complete)
    }

    /// A task owns the page in these states.
    pub fn is_busy(self) -> bool {
        matches!(self, PageStatus::Scripting | PageStatus::Inking)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageStatus::Idle => "idle",
            PageStatus::Scripting => "scripting",
            PageStatus::Inking => "inking",
            PageStatus::Complete => "complete",
            PageStatus::Error => "error",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub index: PageIndex,
    pub kind: PageKind,
    pub status: PageStatus,
    pub beat: Option<Beat>,
    pub artifact: Option<ImageArtifact>,
    pub errored: bool,
}

impl PageRecord {
    pub fn idle(index: PageIndex, kind: PageKind) -> Self {
        Self {
            index,
            kind,
            status: PageStatus::Idle,
            beat: None,
            artifact: None,
            errored: false,
        }
    }

    /// Ready to show: has an artifact and nothing is regenerating it.
    pub fn is_ready(&self) -> bool {
        self.artifact.is_some() && !self.status.is_busy()
    }
}

/// Partial update merged into a record by `PageStore::upsert`.
///
/// Unset fields are preserved. `beat` and `artifact` use a nested `Option`
/// so that callers can distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageUpdate {
    pub status: Option<PageStatus>,
    pub beat: Option<Option<Beat>>,
    pub artifact: Option<Option<ImageArtifact>>,
    pub errored: Option<bool>,
}

impl PageUpdate {
    pub fn status(status: PageStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_beat(mut self, beat: Beat) -> Self {
        self.beat = Some(Some(beat));
        self
    }

    pub fn with_artifact(mut self, artifact: ImageArtifact) -> Self {
        self.artifact = Some(Some(artifact));
        self
    }

    pub fn clear_artifact(mut self) -> Self {
        self.artifact = Some(None);
        self
    }

    pub fn errored(mut self, errored: bool) -> Self {
        self.errored = Some(errored);
        self
    }

    /// Apply onto a copy of `record`.
    pub(crate) fn merged_into(self, record: &PageRecord) -> PageRecord {
        let mut next = record.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(beat) = self.beat {
            next.beat = beat;
        }
        if let Some(artifact) = self.artifact {
            next.artifact = artifact;
        }
        if let Some(errored) = self.errored {
            next.errored = errored;
        }
        next
    }
}

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Canonical page index type. 0 is the cover, the last index the back cover.
pub type PageIndex = usize;

/// What a page is, derived purely from its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Cover,
    Story,
    BackCover,
}

impl PageKind {
    /// Kind of `index` in a session whose back cover sits at `back_cover_index`.
    pub fn for_index(index: PageIndex, back_cover_index: PageIndex) -> Self {
        if index == 0 {
            PageKind::Cover
        } else if index == back_cover_index {
            PageKind::BackCover
        } else {
            PageKind::Story
        }
    }

    /// Covers skip the narrative stage.
    pub fn needs_beat(self) -> bool {
        matches!(self, PageKind::Story)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Cover => "cover",
            PageKind::Story => "story",
            PageKind::BackCover => "back_cover",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which character a panel centres on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusCharacter {
    Hero,
    Friend,
    Other,
}

/// How much prose the narrative generator should write.
///
/// - `Rich`: descriptive captions and meaningful dialogue (default).
/// - `Action`: short captions, snappy dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Rich,
    Action,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Rich
    }
}

/// Languages the narrative generator is allowed to write in, as (code, name).
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// Display name for a language code, if it is supported.
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code.trim()))
        .map(|(_, name)| *name)
}

/// Structured narrative unit for one story page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    pub scene: String,
    #[serde(rename = "focus_char")]
    pub focus: FocusCharacter,
}

impl Beat {
    /// Parse and validate a beat from the generator's JSON output.
    ///
    /// Anything that does not match the schema is a generation error, not a
    /// transport error.
    pub fn from_json(text: &str) -> Result<Self, GenerationError> {
        let mut beat: Beat = serde_json::from_str(text.trim())
            .map_err(|e| GenerationError::Malformed(format!("beat JSON: {e}")))?;

        if beat.caption.trim().is_empty() {
            return Err(GenerationError::Malformed("beat has an empty caption".into()));
        }
        if beat.scene.trim().is_empty() {
            return Err(GenerationError::Malformed("beat has an empty scene".into()));
        }
        if beat
            .dialogue
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            beat.dialogue = None;
        }

        Ok(beat)
    }
}

/// Opaque generated (or uploaded) image.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl ImageArtifact {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Decode an artifact from base64 payload, as returned inline by the
    /// rendering service.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self, GenerationError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GenerationError::Malformed(format!("image data: {e}")))?;
        Ok(Self::new(mime_type, bytes))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Keep image bytes out of logs.
impl fmt::Debug for ImageArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageArtifact")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaRole {
    Hero,
    Friend,
}

impl PersonaRole {
    pub fn label(self) -> &'static str {
        match self {
            PersonaRole::Hero => "HERO",
            PersonaRole::Friend => "SIDEKICK",
        }
    }
}

/// Reference image plus display name for one character.
///
/// Set before launch and never mutated by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaReference {
    pub role: PersonaRole,
    pub name: String,
    pub image: ImageArtifact,
}

/// Shared visual style string used by every artwork request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleContext(Arc<str>);

impl StyleContext {
    pub fn new(style: impl AsRef<str>) -> Self {
        Self(Arc::from(style.as_ref().trim()))
    }

    /// Fallback when neither config nor hero analysis produced a style.
    pub fn default_for_genre(genre: &str) -> Self {
        Self::new(format!(
            "{genre} comic book art style, high quality ink and vibrant colors"
        ))
    }

    /// Explicit style wins, then the analysed one, then the genre default.
    pub fn resolve(explicit: Option<&str>, analysed: Option<&str>, genre: &str) -> Self {
        explicit
            .or(analysed)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .unwrap_or_else(|| Self::default_for_genre(genre))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::Verbosity;

/// Image model that requires a credential probe before launch.
pub const PREMIUM_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [story]
/// genre = "Noir"
/// tone = "Gritty"
/// language = "en"
/// premise = "A detective hunts a thief who steals shadows."
/// story_pages = 10
///
/// [hero]
/// name = "Vex"
/// image = "vex.jpg"
///
/// [render]
/// image_model = "gemini-2.5-flash-image"
///
/// [session]
/// prefetch_story_pages = 1
/// request_timeout = "180s"
/// ```
///
/// Everything except `[hero].name` has a default.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub story: StorySection,

    /// The main character. Launch is refused without one.
    #[serde(default)]
    pub hero: Option<PersonaSection>,

    /// Optional sidekick.
    #[serde(default)]
    pub friend: Option<PersonaSection>,

    #[serde(default)]
    pub render: RenderSection,

    #[serde(default)]
    pub session: SessionSection,
}

/// `[story]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorySection {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_genre")]
    pub genre: String,

    #[serde(default = "default_tone")]
    pub tone: String,

    /// Language code (`en`, `es`, `fr`, `de`, `ja`, `ko`).
    #[serde(default = "default_language")]
    pub language: String,

    /// Free-text premise. When empty, the hero analysis may suggest one.
    #[serde(default)]
    pub premise: Option<String>,

    #[serde(default)]
    pub verbosity: Verbosity,

    /// Number of story pages between the cover and the back cover.
    #[serde(default = "default_story_pages")]
    pub story_pages: usize,
}

fn default_title() -> String {
    "Infinite Heroes".to_string()
}

fn default_genre() -> String {
    "Superhero".to_string()
}

fn default_tone() -> String {
    "Gritty".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_story_pages() -> usize {
    10
}

impl Default for StorySection {
    fn default() -> Self {
        Self {
            title: default_title(),
            genre: default_genre(),
            tone: default_tone(),
            language: default_language(),
            premise: None,
            verbosity: Verbosity::default(),
            story_pages: default_story_pages(),
        }
    }
}

/// `[hero]` / `[friend]` sections.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaSection {
    pub name: String,

    /// Reference image (jpg, png or webp), relative to the config file.
    #[serde(default)]
    pub image: Option<PathBuf>,
}

/// `[render]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderSection {
    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Model used to analyse the hero reference before launch.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    /// Only sent with the premium image model.
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// Explicit visual style; overrides the hero analysis.
    #[serde(default)]
    pub style: Option<String>,

    /// Ask the vision model for a premise and style before launch.
    #[serde(default = "default_true")]
    pub analyze_hero: bool,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_text_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_image_model() -> String {
    PREMIUM_IMAGE_MODEL.to_string()
}

fn default_vision_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_aspect_ratio() -> String {
    "3:4".to_string()
}

fn default_image_size() -> String {
    "1K".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            text_model: default_text_model(),
            image_model: default_image_model(),
            vision_model: default_vision_model(),
            aspect_ratio: default_aspect_ratio(),
            image_size: default_image_size(),
            style: None,
            analyze_hero: default_true(),
            api_base: default_api_base(),
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// Story pages generated at launch, before the reader opens the book.
    #[serde(default = "default_prefetch")]
    pub prefetch_story_pages: usize,

    /// Per-call timeout for remote generation, e.g. `"180s"` or `"3m"`.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Where finished pages are exported.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_prefetch() -> usize {
    1
}

fn default_request_timeout() -> String {
    "180s".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("comic")
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            prefetch_story_pages: default_prefetch(),
            request_timeout: default_request_timeout(),
            output_dir: default_output_dir(),
        }
    }
}

/// Validated story settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySettings {
    pub title: String,
    pub genre: String,
    pub tone: String,
    pub language_code: String,
    pub language_name: String,
    pub premise: Option<String>,
    pub verbosity: Verbosity,
    pub story_pages: usize,
}

impl StorySettings {
    /// Premise sent to the generator, with the stock fallback.
    pub fn premise_or_default(&self) -> &str {
        self.premise
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("A thrilling comic book adventure.")
    }

    /// Back cover index; the session has `back_cover_index() + 1` pages.
    pub fn back_cover_index(&self) -> usize {
        self.story_pages + 1
    }

    pub fn page_count(&self) -> usize {
        self.story_pages + 2
    }
}

impl Default for StorySettings {
    fn default() -> Self {
        let raw = StorySection::default();
        Self {
            title: raw.title,
            genre: raw.genre,
            tone: raw.tone,
            language_code: raw.language,
            language_name: "English".to_string(),
            premise: raw.premise,
            verbosity: raw.verbosity,
            story_pages: raw.story_pages,
        }
    }
}

/// Validated render settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub text_model: String,
    pub image_model: String,
    pub vision_model: String,
    pub aspect_ratio: String,
    pub image_size: String,
    pub style: Option<String>,
    pub analyze_hero: bool,
    pub api_base: String,
}

impl RenderSettings {
    /// The premium configuration needs a credential probe before launch.
    pub fn is_premium(&self) -> bool {
        self.image_model == PREMIUM_IMAGE_MODEL
    }

    /// Image size is only understood by the premium model.
    pub fn effective_image_size(&self) -> Option<&str> {
        self.is_premium().then_some(self.image_size.as_str())
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        let raw = RenderSection::default();
        Self {
            text_model: raw.text_model,
            image_model: raw.image_model,
            vision_model: raw.vision_model,
            aspect_ratio: raw.aspect_ratio,
            image_size: raw.image_size,
            style: raw.style,
            analyze_hero: raw.analyze_hero,
            api_base: raw.api_base,
        }
    }
}

/// Validated session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub prefetch_story_pages: usize,
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
}

/// Validated configuration.
///
/// Only constructible through `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub story: StorySettings,
    pub hero: PersonaSection,
    pub friend: Option<PersonaSection>,
    pub render: RenderSettings,
    pub session: SessionSettings,
}

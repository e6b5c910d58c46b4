#![allow(dead_code)]

use std::sync::Arc;

use inkflow::config::{RenderSettings, StorySettings, PREMIUM_IMAGE_MODEL};
use inkflow::engine::{RuntimeOptions, SessionConfig};
use inkflow::types::{
    Beat, FocusCharacter, ImageArtifact, PageIndex, PersonaReference, PersonaRole, StyleContext,
};

/// Builder for `SessionConfig` to simplify test setup.
///
/// Defaults: 10 story pages, prefetch 1, hero "Vex", non-premium image
/// model, no references, `exit_when_idle = false`.
pub struct SessionBuilder {
    story: StorySettings,
    render: RenderSettings,
    hero_name: Option<String>,
    friend_name: Option<String>,
    references: Vec<Arc<PersonaReference>>,
    style: Option<String>,
    prefetch: usize,
    exit_when_idle: bool,
}

impl SessionBuilder {
    pub fn new() -> Self {
        let render = RenderSettings {
            image_model: "gemini-2.5-flash-image".to_string(),
            ..RenderSettings::default()
        };
        Self {
            story: StorySettings::default(),
            render,
            hero_name: Some("Vex".to_string()),
            friend_name: None,
            references: Vec::new(),
            style: None,
            prefetch: 1,
            exit_when_idle: false,
        }
    }

    pub fn story_pages(mut self, pages: usize) -> Self {
        self.story.story_pages = pages;
        self
    }

    pub fn prefetch(mut self, pages: usize) -> Self {
        self.prefetch = pages;
        self
    }

    pub fn premise(mut self, premise: &str) -> Self {
        self.story.premise = Some(premise.to_string());
        self
    }

    pub fn hero(mut self, name: &str) -> Self {
        self.hero_name = Some(name.to_string());
        self
    }

    pub fn friend(mut self, name: &str) -> Self {
        self.friend_name = Some(name.to_string());
        self
    }

    pub fn reference(mut self, role: PersonaRole, name: &str) -> Self {
        self.references.push(Arc::new(PersonaReference {
            role,
            name: name.to_string(),
            image: artifact(&format!("ref-{name}")),
        }));
        self
    }

    pub fn style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    pub fn premium(mut self) -> Self {
        self.render.image_model = PREMIUM_IMAGE_MODEL.to_string();
        self
    }

    pub fn exit_when_idle(mut self, val: bool) -> Self {
        self.exit_when_idle = val;
        self
    }

    pub fn build(self) -> SessionConfig {
        let mut config = SessionConfig::new(self.story, self.render);
        config.hero_name = self.hero_name;
        config.friend_name = self.friend_name;
        config.references = self.references;
        if let Some(style) = self.style {
            config.style = StyleContext::new(style);
        }
        config.prefetch_story_pages = self.prefetch;
        config.options = RuntimeOptions {
            exit_when_idle: self.exit_when_idle,
        };
        config
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Beat whose caption names the page, so history contents are easy to check.
pub fn beat_for(page: PageIndex) -> Beat {
    Beat {
        caption: format!("caption {page}"),
        dialogue: Some(format!("line {page}")),
        scene: format!("scene {page}"),
        focus: FocusCharacter::Hero,
    }
}

/// Small PNG-typed artifact carrying `tag` as its bytes.
pub fn artifact(tag: &str) -> ImageArtifact {
    ImageArtifact::new("image/png", tag.as_bytes().to_vec())
}

pub fn artifact_for(page: PageIndex) -> ImageArtifact {
    artifact(&format!("page-{page}"))
}

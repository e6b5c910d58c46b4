// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    ConfigFile, PersonaSection, RawConfigFile, RenderSection, RenderSettings, SessionSettings,
    StorySection, StorySettings,
};
use crate::errors::{InkflowError, Result};
use crate::types::language_name;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = InkflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let story = validate_story(raw.story)?;
        let hero = validate_hero(raw.hero)?;
        let friend = raw.friend.map(|f| validate_persona("friend", f)).transpose()?;
        let render = validate_render(raw.render)?;

        let request_timeout = parse_duration(&raw.session.request_timeout).map_err(|e| {
            InkflowError::ConfigError(format!("[session].request_timeout: {e}"))
        })?;
        if request_timeout.is_zero() {
            return Err(InkflowError::ConfigError(
                "[session].request_timeout must be greater than zero".to_string(),
            ));
        }

        let session = SessionSettings {
            prefetch_story_pages: raw.session.prefetch_story_pages.min(story.story_pages),
            request_timeout,
            output_dir: raw.session.output_dir,
        };

        Ok(ConfigFile {
            story,
            hero,
            friend,
            render,
            session,
        })
    }
}

fn validate_story(raw: StorySection) -> Result<StorySettings> {
    if raw.story_pages == 0 {
        return Err(InkflowError::ConfigError(
            "[story].story_pages must be >= 1 (got 0)".to_string(),
        ));
    }

    let language_name = language_name(&raw.language).ok_or_else(|| {
        InkflowError::ConfigError(format!(
            "[story].language '{}' is not supported (expected one of en, es, fr, de, ja, ko)",
            raw.language
        ))
    })?;

    for (field, value) in [("title", &raw.title), ("genre", &raw.genre), ("tone", &raw.tone)] {
        if value.trim().is_empty() {
            return Err(InkflowError::ConfigError(format!(
                "[story].{field} must not be empty"
            )));
        }
    }

    Ok(StorySettings {
        title: raw.title.trim().to_string(),
        genre: raw.genre.trim().to_string(),
        tone: raw.tone.trim().to_string(),
        language_code: raw.language.trim().to_lowercase(),
        language_name: language_name.to_string(),
        premise: raw
            .premise
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        verbosity: raw.verbosity,
        story_pages: raw.story_pages,
    })
}

fn validate_hero(raw: Option<PersonaSection>) -> Result<PersonaSection> {
    let hero = raw.ok_or_else(|| {
        InkflowError::ConfigError("config must contain a [hero] section".to_string())
    })?;
    validate_persona("hero", hero)
}

fn validate_persona(section: &str, raw: PersonaSection) -> Result<PersonaSection> {
    if raw.name.trim().is_empty() {
        return Err(InkflowError::ConfigError(format!(
            "[{section}].name must not be empty"
        )));
    }
    Ok(PersonaSection {
        name: raw.name.trim().to_string(),
        image: raw.image,
    })
}

fn validate_render(raw: RenderSection) -> Result<RenderSettings> {
    for (field, value) in [
        ("text_model", &raw.text_model),
        ("image_model", &raw.image_model),
        ("vision_model", &raw.vision_model),
        ("aspect_ratio", &raw.aspect_ratio),
        ("api_base", &raw.api_base),
    ] {
        if value.trim().is_empty() {
            return Err(InkflowError::ConfigError(format!(
                "[render].{field} must not be empty"
            )));
        }
    }

    if !is_aspect_ratio(&raw.aspect_ratio) {
        return Err(InkflowError::ConfigError(format!(
            "[render].aspect_ratio '{}' must look like W:H",
            raw.aspect_ratio
        )));
    }

    Ok(RenderSettings {
        text_model: raw.text_model,
        image_model: raw.image_model,
        vision_model: raw.vision_model,
        aspect_ratio: raw.aspect_ratio,
        image_size: raw.image_size,
        style: raw.style.filter(|s| !s.trim().is_empty()),
        analyze_hero: raw.analyze_hero,
        api_base: raw.api_base.trim_end_matches('/').to_string(),
    })
}

fn is_aspect_ratio(s: &str) -> bool {
    match s.split_once(':') {
        Some((w, h)) => {
            matches!((w.trim().parse::<u32>(), h.trim().parse::<u32>()), (Ok(w), Ok(h)) if w > 0 && h > 0)
        }
        None => false,
    }
}

/// Parse a duration like `"500ms"`, `"30s"`, `"3m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(value, 60),
        "h" => scaled_secs(value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn scaled_secs(value: u64, factor: u64) -> std::result::Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration {value} x {factor}s is out of range"))
}

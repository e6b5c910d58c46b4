// src/persona.rs

//! Uploading character reference images.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ConfigFile;
use crate::errors::{InkflowError, Result};
use crate::types::{ImageArtifact, PersonaReference, PersonaRole};

/// MIME type for a reference image, from its extension.
pub fn mime_for_path(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        _ => Err(InkflowError::UnsupportedImage(format!(
            "{} (expected .jpg, .jpeg, .png or .webp)",
            path.display()
        ))),
    }
}

/// Read an image file into a persona reference.
pub fn load_persona(role: PersonaRole, name: &str, path: &Path) -> Result<PersonaReference> {
    let mime_type = mime_for_path(path)?;
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(InkflowError::UnsupportedImage(format!(
            "{} is empty",
            path.display()
        )));
    }

    info!(role = role.label(), %name, path = %path.display(), bytes = bytes.len(), "persona reference loaded");
    Ok(PersonaReference {
        role,
        name: name.to_string(),
        image: ImageArtifact::new(mime_type, bytes),
    })
}

/// Load the hero and sidekick references named in the config, resolving
/// relative image paths against `base_dir`. Personas without an image are
/// skipped; the hero comes first.
pub fn load_cast(cfg: &ConfigFile, base_dir: &Path) -> Result<Vec<Arc<PersonaReference>>> {
    let sections = [(PersonaRole::Hero, Some(&cfg.hero)), (PersonaRole::Friend, cfg.friend.as_ref())];

    let mut cast = Vec::new();
    for (role, section) in sections {
        let Some(section) = section else { continue };
        let Some(image) = &section.image else { continue };
        let path = if image.is_absolute() {
            image.clone()
        } else {
            base_dir.join(image)
        };
        cast.push(Arc::new(load_persona(role, &section.name, &path)?));
    }
    Ok(cast)
}

// src/config/mod.rs

//! Configuration loading and validation for inkflow.
//!
//! - [`model`] defines the TOML-backed raw model and the validated settings.
//! - [`loader`] reads a config file from disk.
//! - [`validate`] turns a `RawConfigFile` into a `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, PersonaSection, RawConfigFile, RenderSettings, SessionSettings, StorySettings,
    PREMIUM_IMAGE_MODEL,
};
pub use validate::parse_duration;

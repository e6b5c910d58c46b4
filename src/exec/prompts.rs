// src/exec/prompts.rs

//! Prompt text sent to the remote models.

use crate::exec::collaborators::{ArtworkRequest, ArtworkSubject, NarrativeRequest};
use crate::types::{PersonaReference, Verbosity};

fn mode_line(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Rich => "RICH NOVEL MODE - Use descriptive captions and meaningful dialogue.",
        Verbosity::Action => "ACTION MODE - Short captions, snappy dialogue.",
    }
}

/// Instructions for scripting one story page.
pub fn narrative_prompt(request: &NarrativeRequest) -> String {
    let hero = request.hero_name.as_deref().unwrap_or("The Hero");
    let friend = request.friend_name.as_deref().unwrap_or("None");

    format!(
        "You are writing Page {page} of a {pages}-page comic book titled \"{title}\".\n\
         TARGET LANGUAGE: {language}.\n\
         GENRE: {genre}. TONE: {tone}.\n\
         USER INSTRUCTIONS/PREMISE: {premise}\n\
         MODE: {mode}\n\
         \n\
         CHARACTERS:\n\
         - HERO NAME: {hero}\n\
         - SIDEKICK NAME: {friend}\n\
         \n\
         HISTORY:\n\
         {history}\n\
         \n\
         REQUIREMENT: Continue the narrative flow. Ensure the character names are used correctly in dialogue.\n\
         This is a linear story. No choices needed.",
        page = request.page,
        pages = request.story_pages,
        title = request.title,
        language = request.language,
        genre = request.genre,
        tone = request.tone,
        premise = request.premise,
        mode = mode_line(request.verbosity),
        history = request.history,
    )
}

/// Caption placed before a reference image.
pub fn reference_caption(reference: &PersonaReference) -> String {
    format!(
        "{} CHARACTER REFERENCE (Name: {}):",
        reference.role.label(),
        reference.name
    )
}

/// Text part of an artwork request (the references travel as separate parts).
pub fn artwork_prompt(request: &ArtworkRequest) -> String {
    let mut prompt = format!(
        "STRICT ART STYLE: {}. MAINTAIN VISUAL CONSISTENCY. ",
        request.style
    );

    match &request.subject {
        ArtworkSubject::Cover {
            title,
            genre,
            hero_name,
        } => {
            prompt.push_str(&format!(
                "DRAMATIC COMIC COVER. Title: \"{}\". Feature the Hero {} from reference in a powerful pose. Background {} theme.",
                title.to_uppercase(),
                hero_name.as_deref().unwrap_or_default(),
                genre
            ));
        }
        ArtworkSubject::BackCover { hero_name } => {
            prompt.push_str(&format!(
                "CINEMATIC BACK COVER. Hero {} walking away into distance. Text: \"THE END\".",
                hero_name.as_deref().unwrap_or_default()
            ));
        }
        ArtworkSubject::Panel { beat, focus_name } => {
            prompt.push_str(&format!(
                "DYNAMIC COMIC PANEL. SCENE: {}. CAPTION: \"{}\"",
                beat.scene, beat.caption
            ));
            if let Some(dialogue) = &beat.dialogue {
                prompt.push_str(&format!(" DIALOGUE: \"{dialogue}\""));
            }
            prompt.push_str(&format!(". Show character {focus_name} as the focal point."));
        }
    }

    prompt
}

/// Question asked of the vision model about the hero reference.
pub fn analysis_prompt(genre: &str) -> String {
    format!(
        "Analyze this character. Given the genre is \"{genre}\", provide: \
         1. A 1-sentence comic book plot premise fitting this character and genre. \
         2. A 1-sentence description of the visual art style. \
         Format clearly as PREMISE: [text] and STYLE: [text]."
    )
}

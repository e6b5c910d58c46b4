// tests/prompts_and_analysis.rs

mod common;
use crate::common::builders::{artifact, beat_for};

use std::sync::Arc;

use inkflow::errors::GenerationError;
use inkflow::exec::prompts::{analysis_prompt, artwork_prompt, narrative_prompt, reference_caption};
use inkflow::exec::{parse_analysis, ArtworkRequest, ArtworkSubject, NarrativeRequest};
use inkflow::pages::{HistoryLog, PageStatus, PageStore, PageUpdate};
use inkflow::types::{Beat, FocusCharacter, PersonaReference, PersonaRole, StyleContext, Verbosity};

fn narrative_request(page: usize, history: HistoryLog) -> NarrativeRequest {
    NarrativeRequest {
        page,
        story_pages: 10,
        title: "Shadow Thief".to_string(),
        language: "English".to_string(),
        genre: "Noir".to_string(),
        tone: "Gritty".to_string(),
        premise: "A detective hunts a thief who steals shadows.".to_string(),
        verbosity: Verbosity::Action,
        hero_name: Some("Vex".to_string()),
        friend_name: None,
        history,
    }
}

fn artwork_request(subject: ArtworkSubject) -> ArtworkRequest {
    ArtworkRequest {
        page: 0,
        references: Vec::new(),
        style: StyleContext::new("ink wash"),
        aspect_ratio: "3:4".to_string(),
        image_size: None,
        subject,
    }
}

/// Store whose story pages 1 and 2 have beats (page 2 without dialogue).
fn store_with_beats() -> PageStore {
    let mut store = PageStore::with_pages(6);
    store.upsert(1, PageUpdate::default().with_beat(beat_for(1))).unwrap();
    let silent = Beat {
        dialogue: None,
        ..beat_for(2)
    };
    store.upsert(2, PageUpdate::default().with_beat(silent)).unwrap();
    store
}

#[test]
fn history_only_contains_earlier_story_pages() {
    let mut store = store_with_beats();
    store
        .upsert(0, PageUpdate::status(PageStatus::Inking))
        .unwrap();
    store
        .upsert(
            0,
            PageUpdate::status(PageStatus::Complete).with_artifact(artifact("cover")),
        )
        .unwrap();

    assert_eq!(HistoryLog::before(&store, 1).indices(), Vec::<usize>::new());
    assert_eq!(HistoryLog::before(&store, 2).indices(), vec![1]);
    assert_eq!(HistoryLog::before(&store, 5).indices(), vec![1, 2]);
    assert_eq!(HistoryLog::from_store(&store).len(), 2);
}

#[test]
fn narrative_prompt_carries_story_settings_and_history() {
    let history = HistoryLog::before(&store_with_beats(), 3);
    let prompt = narrative_prompt(&narrative_request(3, history));

    assert!(prompt.contains("Page 3 of a 10-page comic book titled \"Shadow Thief\""));
    assert!(prompt.contains("TARGET LANGUAGE: English."));
    assert!(prompt.contains("GENRE: Noir. TONE: Gritty."));
    assert!(prompt.contains("A detective hunts a thief who steals shadows."));
    assert!(prompt.contains("ACTION MODE"));
    assert!(prompt.contains("HERO NAME: Vex"));
    assert!(prompt.contains("SIDEKICK NAME: None"));
    assert!(prompt.contains("[Page 1] (Caption: \"caption 1\") (Dialogue: \"line 1\")"));
    assert!(prompt.contains("[Page 2] (Caption: \"caption 2\") (Dialogue: \"\")"));
}

#[test]
fn first_page_prompt_says_so() {
    let prompt = narrative_prompt(&narrative_request(1, HistoryLog::default()));
    assert!(prompt.contains("This is the first page."));
    assert!(!prompt.contains("[Page"));
}

#[test]
fn artwork_prompts_per_subject() {
    let cover = artwork_prompt(&artwork_request(ArtworkSubject::Cover {
        title: "Shadow Thief".to_string(),
        genre: "Noir".to_string(),
        hero_name: Some("Vex".to_string()),
    }));
    assert!(cover.starts_with("STRICT ART STYLE: ink wash."));
    assert!(cover.contains("DRAMATIC COMIC COVER. Title: \"SHADOW THIEF\""));
    assert!(cover.contains("Hero Vex"));
    assert!(cover.contains("Background Noir theme"));

    let back = artwork_prompt(&artwork_request(ArtworkSubject::BackCover {
        hero_name: Some("Vex".to_string()),
    }));
    assert!(back.contains("CINEMATIC BACK COVER"));
    assert!(back.contains("THE END"));

    let panel = artwork_prompt(&artwork_request(ArtworkSubject::Panel {
        beat: beat_for(4),
        focus_name: "Vex".to_string(),
    }));
    assert!(panel.contains("SCENE: scene 4."));
    assert!(panel.contains("CAPTION: \"caption 4\""));
    assert!(panel.contains("DIALOGUE: \"line 4\""));
    assert!(panel.ends_with("Show character Vex as the focal point."));

    let quiet = artwork_prompt(&artwork_request(ArtworkSubject::Panel {
        beat: Beat {
            dialogue: None,
            focus: FocusCharacter::Other,
            ..beat_for(5)
        },
        focus_name: "someone".to_string(),
    }));
    assert!(!quiet.contains("DIALOGUE"));
}

#[test]
fn reference_captions_name_role_and_persona() {
    let hero = Arc::new(PersonaReference {
        role: PersonaRole::Hero,
        name: "Vex".to_string(),
        image: artifact("vex"),
    });
    let friend = PersonaReference {
        role: PersonaRole::Friend,
        name: "Pip".to_string(),
        image: artifact("pip"),
    };
    assert_eq!(reference_caption(&hero), "HERO CHARACTER REFERENCE (Name: Vex):");
    assert_eq!(reference_caption(&friend), "SIDEKICK CHARACTER REFERENCE (Name: Pip):");
}

#[test]
fn analysis_prompt_names_genre_and_format() {
    let prompt = analysis_prompt("Noir");
    assert!(prompt.contains("\"Noir\""));
    assert!(prompt.contains("PREMISE: [text] and STYLE: [text]"));
}

#[test]
fn analysis_parsing_extracts_premise_and_style() {
    let analysis = parse_analysis(
        "Here you go.\n**PREMISE:** A courier outruns a collapsing city.\nstyle:   Moebius-like clean lines **\n",
    );
    assert_eq!(
        analysis.premise.as_deref(),
        Some("A courier outruns a collapsing city.")
    );
    assert_eq!(analysis.style.as_deref(), Some("Moebius-like clean lines"));

    let empty = parse_analysis("I cannot analyse this image.");
    assert!(empty.premise.is_none());
    assert!(empty.style.is_none());

    let blank = parse_analysis("PREMISE:\nSTYLE: pulp");
    assert!(blank.premise.is_none());
    assert_eq!(blank.style.as_deref(), Some("pulp"));
}

#[test]
fn style_resolution_prefers_explicit_then_analysed() {
    assert_eq!(
        StyleContext::resolve(Some("ink"), Some("pulp"), "Noir").as_str(),
        "ink"
    );
    assert_eq!(
        StyleContext::resolve(None, Some(" pulp "), "Noir").as_str(),
        "pulp"
    );
    assert_eq!(
        StyleContext::resolve(Some("  "), None, "Noir").as_str(),
        "Noir comic book art style, high quality ink and vibrant colors"
    );
}

#[test]
fn beat_json_is_validated() {
    let beat = Beat::from_json(
        r#"{"caption": "Rain.", "dialogue": "  ", "scene": "A rooftop", "focus_char": "friend"}"#,
    )
    .unwrap();
    assert_eq!(beat.caption, "Rain.");
    assert_eq!(beat.dialogue, None, "blank dialogue is dropped");
    assert_eq!(beat.focus, FocusCharacter::Friend);

    for bad in [
        "not json",
        r#"{"caption": "", "scene": "x", "focus_char": "hero"}"#,
        r#"{"caption": "x", "scene": " ", "focus_char": "hero"}"#,
        r#"{"caption": "x", "scene": "y", "focus_char": "villain"}"#,
        r#"{"caption": "x", "focus_char": "hero"}"#,
    ] {
        assert!(
            matches!(Beat::from_json(bad), Err(GenerationError::Malformed(_))),
            "{bad}"
        );
    }
}

#[test]
fn generation_errors_are_classified() {
    assert!(GenerationError::classify(Some(401), "nope").is_auth());
    assert!(GenerationError::classify(Some(403), "nope").is_auth());
    assert!(GenerationError::classify(Some(404), "Requested entity was not found.").is_auth());
    assert!(GenerationError::classify(Some(400), "API_KEY_INVALID").is_auth());
    assert!(GenerationError::classify(None, "Permission denied on resource").is_auth());

    assert_eq!(
        GenerationError::classify(Some(503), "overloaded"),
        GenerationError::Transport("overloaded".to_string())
    );
    assert!(!GenerationError::classify(None, "connection reset").is_auth());
}

// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use inkflow::config::{load_and_validate, parse_duration, ConfigFile};
use inkflow::errors::InkflowError;
use inkflow::types::Verbosity;

fn config_from(toml: &str) -> Result<ConfigFile, InkflowError> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{toml}").unwrap();
    load_and_validate(file.path())
}

fn expect_config_error(toml: &str) -> String {
    match config_from(toml) {
        Err(InkflowError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn minimal_config_gets_defaults() {
    let cfg = config_from(
        r#"
[hero]
name = "Vex"
"#,
    )
    .unwrap();

    assert_eq!(cfg.hero.name, "Vex");
    assert!(cfg.hero.image.is_none());
    assert!(cfg.friend.is_none());

    assert_eq!(cfg.story.title, "Infinite Heroes");
    assert_eq!(cfg.story.genre, "Superhero");
    assert_eq!(cfg.story.language_name, "English");
    assert_eq!(cfg.story.verbosity, Verbosity::Rich);
    assert_eq!(cfg.story.story_pages, 10);
    assert_eq!(cfg.story.page_count(), 12);
    assert_eq!(cfg.story.back_cover_index(), 11);
    assert_eq!(cfg.story.premise_or_default(), "A thrilling comic book adventure.");

    assert!(cfg.render.is_premium());
    assert_eq!(cfg.render.effective_image_size(), Some("1K"));
    assert_eq!(cfg.render.aspect_ratio, "3:4");

    assert_eq!(cfg.session.prefetch_story_pages, 1);
    assert_eq!(cfg.session.request_timeout, Duration::from_secs(180));
}

#[test]
fn full_config_is_trimmed_and_normalized() {
    let cfg = config_from(
        r#"
[story]
title = "  Shadow Thief "
genre = "Noir"
tone = "Gritty"
language = "JA"
premise = "   "
verbosity = "action"
story_pages = 3

[hero]
name = " Vex "
image = "vex.png"

[friend]
name = "Pip"

[render]
image_model = "gemini-2.5-flash-image"
aspect_ratio = "2:3"
style = "ink wash"
api_base = "http://localhost:8080/v1beta/"

[session]
prefetch_story_pages = 9
request_timeout = "3m"
output_dir = "out"
"#,
    )
    .unwrap();

    assert_eq!(cfg.story.title, "Shadow Thief");
    assert_eq!(cfg.story.language_code, "ja");
    assert_eq!(cfg.story.language_name, "Japanese");
    assert!(cfg.story.premise.is_none(), "blank premise counts as unset");
    assert_eq!(cfg.story.verbosity, Verbosity::Action);
    assert_eq!(cfg.hero.name, "Vex");
    assert_eq!(cfg.friend.as_ref().map(|f| f.name.as_str()), Some("Pip"));

    assert!(!cfg.render.is_premium());
    assert_eq!(cfg.render.effective_image_size(), None);
    assert_eq!(cfg.render.style.as_deref(), Some("ink wash"));
    assert_eq!(cfg.render.api_base, "http://localhost:8080/v1beta");

    // Prefetch never exceeds the story length.
    assert_eq!(cfg.session.prefetch_story_pages, 3);
    assert_eq!(cfg.session.request_timeout, Duration::from_secs(180));
    assert_eq!(cfg.session.output_dir.to_str(), Some("out"));
}

#[test]
fn missing_hero_is_rejected() {
    let msg = expect_config_error(
        r#"
[story]
genre = "Noir"
"#,
    );
    assert!(msg.contains("[hero]"));
}

#[test]
fn blank_persona_names_are_rejected() {
    let msg = expect_config_error(
        r#"
[hero]
name = "Vex"

[friend]
name = "  "
"#,
    );
    assert!(msg.contains("[friend].name"));
}

#[test]
fn unsupported_language_is_rejected() {
    let msg = expect_config_error(
        r#"
[story]
language = "xx"

[hero]
name = "Vex"
"#,
    );
    assert!(msg.contains("'xx'"));
}

#[test]
fn zero_story_pages_is_rejected() {
    let msg = expect_config_error(
        r#"
[story]
story_pages = 0

[hero]
name = "Vex"
"#,
    );
    assert!(msg.contains("story_pages"));
}

#[test]
fn bad_aspect_ratio_is_rejected() {
    for ratio in ["square", "3:0", "3x4"] {
        let msg = expect_config_error(&format!(
            r#"
[hero]
name = "Vex"

[render]
aspect_ratio = "{ratio}"
"#
        ));
        assert!(msg.contains("aspect_ratio"), "{ratio}: {msg}");
    }
}

#[test]
fn bad_or_zero_timeout_is_rejected() {
    for timeout in ["soon", "10", "0s"] {
        let msg = expect_config_error(&format!(
            r#"
[hero]
name = "Vex"

[session]
request_timeout = "{timeout}"
"#
        ));
        assert!(msg.contains("request_timeout"), "{timeout}: {msg}");
    }
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let result = config_from("[hero\nname = ");
    assert!(matches!(result, Err(InkflowError::TomlError(_))), "{result:?}");
}

#[test]
fn duration_suffixes() {
    assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
    assert_eq!(parse_duration(" 30s "), Ok(Duration::from_secs(30)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("12").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn oversized_durations_are_errors() {
    assert_eq!(
        parse_duration("18446744073709551615s"),
        Ok(Duration::from_secs(u64::MAX))
    );
    assert!(parse_duration("18446744073709551615m").is_err());
    assert!(parse_duration("5124095576030432h").is_err());
    assert!(parse_duration("99999999999999999999s").is_err(), "does not fit in u64");

    let msg = expect_config_error(
        r#"
[hero]
name = "Vex"

[session]
request_timeout = "18446744073709551615h"
"#,
    );
    assert!(msg.contains("request_timeout"), "{msg}");
    assert!(msg.contains("out of range"), "{msg}");
}

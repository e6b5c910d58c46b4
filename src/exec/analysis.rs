// src/exec/analysis.rs

//! Parsing of the vision model's hero analysis.

use std::sync::LazyLock;

use regex::Regex;

static PREMISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)PREMISE:[ \t]*([^\n]*)").expect("Valid premise regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)STYLE:[ \t]*([^\n]*)").expect("Valid style regex"));

/// Premise and style suggested for the hero; either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroAnalysis {
    pub premise: Option<String>,
    pub style: Option<String>,
}

/// Extract the `PREMISE:` and `STYLE:` lines (case-insensitive, first match
/// wins, surrounding whitespace and markdown emphasis trimmed).
pub fn parse_analysis(text: &str) -> HeroAnalysis {
    HeroAnalysis {
        premise: capture_line(&PREMISE_RE, text),
        style: capture_line(&STYLE_RE, text),
    }
}

fn capture_line(re: &Regex, text: &str) -> Option<String> {
    let value = re.captures(text)?.get(1)?.as_str();
    let value = value.trim().trim_matches('*').trim();
    (!value.is_empty()).then(|| value.to_string())
}

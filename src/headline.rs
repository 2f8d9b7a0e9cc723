//! Heuristic segmentation of concatenated aggregator headlines.
//!
//! Aggregators hand back a single string holding one or more headlines,
//! each optionally followed by a capitalized outlet name, with no reliable
//! delimiter. The patterns here treat a capitalized word-run as a source
//! attribution and split around it. First-match-wins priority keeps the
//! behavior reproducible; on ambiguous capitalization it may under- or
//! over-split, which is accepted rather than worked around.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

// Boundary patterns tried in priority order by `first_headline`:
// headline then trailing source, headline then source then a second
// headline, and sentence-terminated headline then source.
static SOURCE_AT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s+[A-Z][A-Za-z0-9 ]+\s*$").expect("boundary regex"));
static SOURCE_THEN_HEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s+[A-Z][A-Za-z0-9 ]+\s+[A-Z]").expect("boundary regex"));
static SENTENCE_THEN_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\.\s+[A-Z][A-Za-z0-9 ]+").expect("boundary regex"));

// Source-attribution delimiter used by `segment_all`: an optional sentence
// boundary followed by a capitalized word-run.
static SOURCE_DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\.\s+|\s+)[A-Z][A-Za-z0-9 ]+(?:\s+|\.\s+|$)").expect("delimiter regex")
});

// Trailing "<title> - <Source>" attribution with no further hyphen.
static TITLE_SOURCE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.+)\s+-\s+([^-]+)$").expect("suffix regex"));

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex"));

/// Decodes HTML entities and collapses whitespace (non-breaking spaces
/// included) so the boundary patterns see a single clean line.
fn decode(raw: &str) -> String {
    let text = html_escape::decode_html_entities(raw);
    let text = text.replace('\u{a0}', " ");
    WHITESPACE_RUNS.replace_all(&text, " ").into_owned()
}

/// Splits after sentence-ending punctuation followed by whitespace,
/// keeping the terminator with the preceding sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BREAK.find_iter(text) {
        // The terminator is a single ASCII byte.
        sentences.push(text[start..boundary.start() + 1].to_string());
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(text[start..].to_string());
    }
    sentences
}

/// Returns just the first headline from a concatenated block, with its
/// trailing source name stripped.
pub fn first_headline(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = decode(raw);

    for pattern in [&*SOURCE_AT_END, &*SOURCE_THEN_HEADLINE, &*SENTENCE_THEN_SOURCE] {
        if let Some(caps) = pattern.captures(&text) {
            return caps[1].trim().to_string();
        }
    }

    // No source boundary found: fall back to the first sentence.
    if let Some(first) = split_sentences(&text).first() {
        return first.trim().to_string();
    }

    text.trim().to_string()
}

/// Splits a concatenated block into all of its headlines, in input order.
///
/// Text between source-attribution delimiters accumulates as headline
/// content; hitting a delimiter emits the accumulated headline and drops
/// the source token itself. When no delimiter matches at all, plain
/// sentence splitting is the fallback.
pub fn segment_all(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }

    let text = decode(raw);
    let mut headlines = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for delimiter in SOURCE_DELIMITER.find_iter(&text) {
        current.push_str(&text[start..delimiter.start()]);
        start = delimiter.end();
        if !current.is_empty() {
            headlines.push(current.trim().to_string());
            current.clear();
        }
    }

    current.push_str(&text[start..]);
    if !current.trim().is_empty() {
        headlines.push(current.trim().to_string());
    }

    if headlines.is_empty() {
        headlines = split_sentences(&text)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    headlines
}

/// Pulls the outlet name out of a `"Title - Source"` style title, or a
/// fixed placeholder when no such suffix exists.
pub fn extract_source(title: &str) -> String {
    TITLE_SOURCE_SUFFIX
        .captures(title)
        .map(|caps| caps[2].trim().to_string())
        .unwrap_or_else(|| "unknown source".to_string())
}

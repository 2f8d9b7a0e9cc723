//! Summary selection: extractive truncation for article text and a
//! model-backed path for feed entries with a deterministic fallback chain.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::headline;
use crate::types::{ExtractError, Result};

/// Default length bound for article summaries.
pub const ARTICLE_SUMMARY_LENGTH: usize = 250;
/// Default length bound for feed-entry summaries.
pub const FEED_SUMMARY_LENGTH: usize = 60;

/// Inputs shorter than this (whitespace tokens) skip the model call.
const MIN_MODEL_TOKENS: usize = 10;
/// Paragraphs longer than this count as substantial.
const SUBSTANTIAL_PARAGRAPH_LEN: usize = 50;

/// Builds an extractive summary: the first substantial paragraph, cut at
/// sentence boundaries when it exceeds `max_length`.
pub fn summarize(text: &str, max_length: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim();
        if paragraph.len() <= SUBSTANTIAL_PARAGRAPH_LEN {
            continue;
        }
        if paragraph.len() <= max_length {
            return paragraph.to_string();
        }

        // Accumulate whole sentences while they fit.
        let sentences: Vec<&str> = paragraph.split(". ").collect();
        let mut summary = sentences[0].to_string();
        let mut taken = 1;
        while taken < sentences.len() && summary.len() + sentences[taken].len() + 2 <= max_length {
            summary.push_str(". ");
            summary.push_str(sentences[taken]);
            taken += 1;
        }
        summary.push_str(if taken < sentences.len() { "..." } else { "." });
        return summary;
    }

    // No substantial paragraph: plain truncation.
    if text.chars().count() > max_length {
        let truncated: String = text.chars().take(max_length).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

/// External summarization capability.
///
/// The capability is optional at runtime: call sites receive an
/// `Option<&dyn Summarize>` and must treat `None`, errors and empty output
/// as the same non-fatal condition.
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Produces a single best summary bounded by `max_length`, using
    /// deterministic decoding.
    async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String>;
}

/// Model-backed summary for a feed entry, with heuristic fallbacks.
///
/// The input is segmented into individual headlines first so the model
/// sees all of them without source-attribution noise. Very short inputs
/// are returned as-is rather than fed to a model below its minimum viable
/// length. Any capability failure falls back to the first headline.
pub async fn ai_summarize(
    text: &str,
    max_length: usize,
    summarizer: Option<&dyn Summarize>,
) -> String {
    if text.is_empty() {
        return String::new();
    }

    let headlines = headline::segment_all(text);
    let input = if headlines.is_empty() {
        text.to_string()
    } else {
        headlines.join(" ")
    };

    if input.split_whitespace().count() < MIN_MODEL_TOKENS {
        return input;
    }

    if let Some(summarizer) = summarizer {
        match summarizer.summarize(&input, max_length, MIN_MODEL_TOKENS).await {
            Ok(summary) if !summary.trim().is_empty() => return summary.trim().to_string(),
            Ok(_) => warn!("summarizer returned empty output"),
            Err(e) => warn!("summarization failed: {}", e),
        }
    }

    headline::first_headline(text)
}

/// Summarizer backed by a hosted inference endpoint.
///
/// Expects the endpoint to accept `{"inputs": ..., "parameters": {...}}`
/// and answer with `[{"summary_text": ...}]`.
pub struct HttpSummarizer {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpSummarizer {
    /// Reads `SUMMARIZER_URL` (and optionally `SUMMARIZER_TOKEN`); absence
    /// of the variable means the capability is simply not available.
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("SUMMARIZER_URL").ok()?;
        let api_token = env::var("SUMMARIZER_TOKEN").ok();

        match Client::builder().timeout(Duration::from_secs(60)).build() {
            Ok(client) => {
                info!("summarizer initialized for endpoint {}", endpoint);
                Some(Self {
                    client,
                    endpoint,
                    api_token,
                })
            }
            Err(e) => {
                warn!("could not initialize summarizer client: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Summarize for HttpSummarizer {
    async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        debug!("requesting summary ({} bytes input)", text.len());

        let body = serde_json::json!({
            "inputs": text,
            "parameters": {
                "max_length": max_length,
                "min_length": min_length,
                "do_sample": false,
            },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Summarization(format!(
                "endpoint returned HTTP {}",
                status
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        let summary = payload
            .get(0)
            .and_then(|entry| entry.get("summary_text"))
            .and_then(|value| value.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExtractError::Summarization("empty summary in response".to_string()))?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_substantial_paragraph_verbatim() {
        let text = "short intro\nThis paragraph is comfortably over fifty characters long and fits.";
        assert_eq!(
            summarize(text, 250),
            "This paragraph is comfortably over fifty characters long and fits."
        );
    }

    #[test]
    fn cuts_at_sentence_boundary_with_ellipsis() {
        let first = "A first sentence that is certainly long enough to count as substantial here";
        let text = format!("{first}. Second sentence adding detail. Third sentence beyond the cap.");
        let summary = summarize(&text, 100);
        assert!(summary.starts_with(first));
        assert!(summary.ends_with("..."));
        assert!(summary.len() <= 103);
    }

    #[test]
    fn truncates_when_no_substantial_paragraph() {
        let text = "tiny lines\nonly here\nnothing passes fifty chars";
        let summary = summarize(text, 30);
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= 33);
    }
}

//! Retry orchestration for single-article extraction.
//!
//! One URL runs through a finite attempt loop: rotate the request
//! identity, download and parse, normalize, enforce the content-length
//! floor. Attempts are strictly sequential with a linear backoff sleep in
//! between; every path terminates in a structured [`ExtractionResult`].

use std::time::Duration;

use chrono::DateTime;
use tracing::{error, info, warn};
use url::Url;

use crate::article::{ArticleFetcher, DownloadedArticle};
use crate::normalize::normalize;
use crate::summary;
use crate::types::{ArticleMeta, ExtractError, ExtractionResult, FetchConfig, Result};

/// Realistic browser identities rotated across attempts to vary
/// fingerprinting against naive identity-based blocking.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 16_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1",
];

/// Minimum whitespace-delimited tokens for text to count as an article.
pub const MIN_CONTENT_TOKENS: usize = 20;

/// Identity for a given attempt number, cycling through the pool.
pub fn user_agent_for_attempt(attempt: u32) -> &'static str {
    USER_AGENTS[attempt as usize % USER_AGENTS.len()]
}

/// Backoff before the retry following `attempt` (0-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt + 1) * 2)
}

pub struct Extractor<F> {
    fetcher: F,
    config: FetchConfig,
}

impl<F: ArticleFetcher> Extractor<F> {
    pub fn new(fetcher: F, config: FetchConfig) -> Self {
        Self { fetcher, config }
    }

    /// Extracts one article, retrying transient failures. Never returns
    /// an error: malformed URLs fail immediately, everything else fails
    /// only after the attempt budget is exhausted.
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        info!("extracting article from: {}", url);

        // A usable URL needs both a scheme and a network location.
        match Url::parse(url) {
            Ok(parsed) if parsed.has_host() => {}
            _ => return ExtractionResult::failure(ExtractError::InvalidUrl.to_string(), None),
        }

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let total_attempts = self.config.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 0..total_attempts {
            let user_agent = user_agent_for_attempt(attempt);
            info!("downloading article (attempt {}/{})", attempt + 1, total_attempts);

            match self.attempt(url, user_agent, timeout).await {
                Ok(result) => return result,
                Err(e) => {
                    warn!("extraction attempt {} failed: {}", attempt + 1, e);
                    last_error = e.to_string();
                    if attempt + 1 < total_attempts {
                        let delay = backoff_delay(attempt);
                        info!("retrying in {} seconds...", delay.as_secs());
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        error!("all {} attempts failed for {}", total_attempts, url);
        ExtractionResult::failure(last_error, Some(url))
    }

    async fn attempt(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<ExtractionResult> {
        let article = self.fetcher.fetch(url, user_agent, timeout).await?;

        let text = normalize(&article.text);
        if text.split_whitespace().count() < MIN_CONTENT_TOKENS {
            return Err(ExtractError::ContentTooShort {
                minimum: MIN_CONTENT_TOKENS,
            });
        }

        Ok(build_success(article, text))
    }
}

fn build_success(article: DownloadedArticle, text: String) -> ExtractionResult {
    let summary = summary::summarize(&text, summary::ARTICLE_SUMMARY_LENGTH);
    let publish_date = article.publish_date.map(|raw| to_iso8601(&raw));

    ExtractionResult::success(
        normalize(&article.title),
        text,
        summary,
        article.top_image,
        article.authors,
        publish_date,
        ArticleMeta {
            keywords: article.meta_keywords,
            description: article.meta_description,
            language: article.meta_language,
        },
    )
}

/// ISO-8601 when the raw date parses, otherwise the raw string as-is.
fn to_iso8601(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.to_rfc3339())
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|dt| dt.to_rfc3339()))
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rotation_wraps_around_the_pool() {
        assert_eq!(user_agent_for_attempt(0), USER_AGENTS[0]);
        assert_eq!(user_agent_for_attempt(1), USER_AGENTS[1]);
        assert_eq!(
            user_agent_for_attempt(USER_AGENTS.len() as u32),
            USER_AGENTS[0]
        );
    }

    #[test]
    fn backoff_schedule_is_linear() {
        assert_eq!(backoff_delay(0), Duration::from_secs(2));
        assert_eq!(backoff_delay(1), Duration::from_secs(4));
        assert_eq!(backoff_delay(2), Duration::from_secs(6));
    }

    #[test]
    fn publish_date_falls_back_to_raw_string() {
        assert_eq!(to_iso8601("not a date"), "not a date");
        assert_eq!(
            to_iso8601("2024-03-01T09:30:00Z"),
            "2024-03-01T09:30:00+00:00"
        );
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use newswire::types::Result;
use newswire::{
    ArticleFetcher, DownloadedArticle, ExtractError, Extractor, FetchConfig, USER_AGENTS,
};

const LONG_TEXT: &str = "The central bank raised its benchmark interest rate by a quarter \
point on Wednesday, citing persistent inflation pressure across housing and services. \
Officials signaled further moves may follow later in the year.";

fn good_article() -> DownloadedArticle {
    DownloadedArticle {
        title: "Rates  climb\nagain".to_string(),
        text: LONG_TEXT.to_string(),
        authors: vec!["A. Reporter".to_string()],
        publish_date: Some("2024-03-01T09:30:00Z".to_string()),
        top_image: Some("https://example.com/lead.jpg".to_string()),
        meta_keywords: vec!["rates".to_string()],
        meta_description: "Central bank raises rates.".to_string(),
        meta_language: "en".to_string(),
    }
}

/// Fails every attempt, counting how many were made.
struct FailingFetcher {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl ArticleFetcher for FailingFetcher {
    async fn fetch(&self, _: &str, _: &str, _: Duration) -> Result<DownloadedArticle> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ExtractError::DownloadFailed { status: 403 })
    }
}

/// Succeeds, but with text below the content floor.
struct ThinContentFetcher {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl ArticleFetcher for ThinContentFetcher {
    async fn fetch(&self, _: &str, _: &str, _: Duration) -> Result<DownloadedArticle> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(DownloadedArticle {
            text: "far too short to count as an article".to_string(),
            ..good_article()
        })
    }
}

/// Records the identity used per attempt, then fails until the last one.
struct RecordingFetcher {
    agents: Arc<Mutex<Vec<String>>>,
    succeed_on: usize,
}

#[async_trait]
impl ArticleFetcher for RecordingFetcher {
    async fn fetch(&self, _: &str, user_agent: &str, _: Duration) -> Result<DownloadedArticle> {
        let mut agents = self.agents.lock().unwrap();
        agents.push(user_agent.to_string());
        if agents.len() >= self.succeed_on {
            Ok(good_article())
        } else {
            Err(ExtractError::DownloadFailed { status: 503 })
        }
    }
}

#[tokio::test(start_paused = true)]
async fn failing_download_performs_exactly_three_attempts() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let extractor = Extractor::new(
        FailingFetcher {
            attempts: attempts.clone(),
        },
        FetchConfig::default(),
    );

    let result = extractor.extract("https://example.com/article").await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(!result.success);
    assert!(!result.extracted);
    assert_eq!(result.error.as_deref(), Some("Download failed with status: 403"));
    assert_eq!(result.url.as_deref(), Some("https://example.com/article"));
    assert!(result.text.is_none());
}

#[tokio::test(start_paused = true)]
async fn thin_content_is_retried_and_never_succeeds() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let extractor = Extractor::new(
        ThinContentFetcher {
            attempts: attempts.clone(),
        },
        FetchConfig::default(),
    );

    let result = extractor.extract("https://example.com/thin").await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("too short"));
}

#[tokio::test]
async fn malformed_url_fails_without_any_attempt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let extractor = Extractor::new(
        FailingFetcher {
            attempts: attempts.clone(),
        },
        FetchConfig::default(),
    );

    let result = extractor.extract("not a url").await;

    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Invalid URL format"));
    assert!(result.url.is_none());
}

#[tokio::test(start_paused = true)]
async fn identity_rotates_across_attempts() {
    let agents = Arc::new(Mutex::new(Vec::new()));
    let extractor = Extractor::new(
        RecordingFetcher {
            agents: agents.clone(),
            succeed_on: usize::MAX,
        },
        FetchConfig::default(),
    );

    let _ = extractor.extract("https://example.com/blocked").await;

    let agents = agents.lock().unwrap();
    assert_eq!(agents.as_slice(), &USER_AGENTS[..3]);
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovers_on_retry() {
    let agents = Arc::new(Mutex::new(Vec::new()));
    let extractor = Extractor::new(
        RecordingFetcher {
            agents: agents.clone(),
            succeed_on: 2,
        },
        FetchConfig::default(),
    );

    let result = extractor.extract("https://example.com/flaky").await;

    assert_eq!(agents.lock().unwrap().len(), 2);
    assert!(result.success);
    assert!(result.extracted);
}

#[tokio::test]
async fn successful_extraction_normalizes_and_summarizes() {
    let extractor = Extractor::new(
        RecordingFetcher {
            agents: Arc::new(Mutex::new(Vec::new())),
            succeed_on: 1,
        },
        FetchConfig::default(),
    );

    let result = extractor.extract("https://example.com/good").await;

    assert!(result.success);
    // Title whitespace collapsed by normalization.
    assert_eq!(result.title.as_deref(), Some("Rates climb again"));
    let text = result.text.expect("text populated on success");
    assert!(!text.contains('\n'));
    assert!(text.split_whitespace().count() >= 20);
    let summary = result.summary.expect("summary populated on success");
    assert!(summary.len() <= 253);
    assert_eq!(
        result.publish_date.as_deref(),
        Some("2024-03-01T09:30:00+00:00")
    );
    assert_eq!(result.authors, Some(vec!["A. Reporter".to_string()]));
    assert_eq!(result.meta.unwrap().language, "en");
    assert!(result.error.is_none());
}

use serde::{Deserialize, Serialize};

/// Metadata extracted from an article page's `<meta>` tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub keywords: Vec<String>,
    pub description: String,
    pub language: String,
}

/// Terminal result of one extraction attempt sequence.
///
/// Exactly one of the two shapes is populated: success with the article
/// fields, or failure with an error message and the original URL. Built
/// through [`ExtractionResult::success`] / [`ExtractionResult::failure`]
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    pub extracted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ArticleMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ExtractionResult {
    pub fn success(
        title: String,
        text: String,
        summary: String,
        top_image: Option<String>,
        authors: Vec<String>,
        publish_date: Option<String>,
        meta: ArticleMeta,
    ) -> Self {
        Self {
            success: true,
            title: Some(title),
            text: Some(text),
            summary: Some(summary),
            top_image,
            authors: Some(authors),
            publish_date,
            extracted: true,
            meta: Some(meta),
            error: None,
            url: None,
        }
    }

    pub fn failure(error: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            success: false,
            title: None,
            text: None,
            summary: None,
            top_image: None,
            authors: None,
            publish_date: None,
            extracted: false,
            meta: None,
            error: Some(error.into()),
            url: url.map(|u| u.to_string()),
        }
    }
}

/// One processed entry from a topical aggregator feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub summary: String,
    #[serde(rename = "originalSummary")]
    pub original_summary: String,
    pub source: String,
    pub extracted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStats {
    pub total: usize,
    pub extracted: usize,
    pub summarized: bool,
    pub source: String,
}

/// CLI output shape for a feed fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedOutput {
    pub success: bool,
    pub category: String,
    pub entries: Vec<FeedEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FeedStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Knobs for the extraction attempt loop and outbound requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed with status: {status}")]
    DownloadFailed { status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Extracted text is too short (less than {minimum} words)")]
    ContentTooShort { minimum: usize },

    #[error("No content found in page")]
    NoContent,

    #[error("Summarization error: {0}")]
    Summarization(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

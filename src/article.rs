//! Article download and HTML parsing behind a trait, so the extraction
//! orchestrator can be exercised without network access.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use scraper::{Html, Selector};
use tracing::debug;

use crate::types::{ExtractError, Result};

/// Raw article fields as parsed from a page, before normalization.
#[derive(Debug, Clone, Default)]
pub struct DownloadedArticle {
    pub title: String,
    pub text: String,
    pub authors: Vec<String>,
    /// Publish date as found in the markup; parsed downstream.
    pub publish_date: Option<String>,
    pub top_image: Option<String>,
    pub meta_keywords: Vec<String>,
    pub meta_description: String,
    pub meta_language: String,
}

/// Download-and-parse capability for a single article URL.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetches the page with the given request identity. A non-success
    /// HTTP status is a distinguishable download failure; transport
    /// errors surface as [`ExtractError::Http`]. The orchestrator treats
    /// both as attempt failures.
    async fn fetch(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<DownloadedArticle>;
}

/// Production fetcher: reqwest download plus scraper-based extraction of
/// the title, body paragraphs and page metadata.
pub struct HttpArticleFetcher {
    client: Client,
}

impl HttpArticleFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<DownloadedArticle> {
        debug!("downloading {} as {}", url, user_agent);

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        parse_page(&html)
    }
}

// scraper's Html is not Send, so all parsing stays in a synchronous
// helper called after the final await.
fn parse_page(html: &str) -> Result<DownloadedArticle> {
    let document = Html::parse_document(html);

    let text = extract_body_text(&document);
    if text.is_empty() {
        return Err(ExtractError::NoContent);
    }

    Ok(DownloadedArticle {
        title: extract_title(&document),
        text,
        authors: extract_authors(&document),
        publish_date: extract_publish_date(&document),
        top_image: meta_content(&document, "meta[property=\"og:image\"]"),
        meta_keywords: extract_keywords(&document),
        meta_description: meta_content(&document, "meta[name=\"description\"]")
            .or_else(|| meta_content(&document, "meta[property=\"og:description\"]"))
            .unwrap_or_default(),
        meta_language: extract_language(&document),
    })
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn extract_title(document: &Html) -> String {
    if let Some(element) = document.select(&selector("title")).next() {
        let title: String = element.text().collect();
        if !title.trim().is_empty() {
            return title.trim().to_string();
        }
    }
    meta_content(document, "meta[property=\"og:title\"]")
        .or_else(|| {
            document
                .select(&selector("h1"))
                .next()
                .map(|h1| h1.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default()
}

/// Prefers paragraphs inside an `<article>` element, falling back to all
/// paragraphs on the page.
fn extract_body_text(document: &Html) -> String {
    for css in ["article p", "p"] {
        let paragraphs: Vec<String> = document
            .select(&selector(css))
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return paragraphs.join("\n\n");
        }
    }
    String::new()
}

fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors: Vec<String> = document
        .select(&selector("meta[name=\"author\"], meta[property=\"article:author\"]"))
        .filter_map(|element| element.value().attr("content"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    authors.dedup();
    authors
}

fn extract_publish_date(document: &Html) -> Option<String> {
    meta_content(document, "meta[property=\"article:published_time\"]").or_else(|| {
        document
            .select(&selector("time[datetime]"))
            .next()
            .and_then(|element| element.value().attr("datetime"))
            .map(|datetime| datetime.trim().to_string())
    })
}

fn extract_keywords(document: &Html) -> Vec<String> {
    meta_content(document, "meta[name=\"keywords\"]")
        .map(|keywords| {
            keywords
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn extract_language(document: &Html) -> String {
    document
        .select(&selector("html"))
        .next()
        .and_then(|element| element.value().attr("lang"))
        .map(|lang| lang.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="en"><head>
        <title>Rates climb again</title>
        <meta name="description" content="Central bank raises rates.">
        <meta name="keywords" content="rates, economy">
        <meta name="author" content="A. Reporter">
        <meta property="og:image" content="https://example.com/lead.jpg">
        <meta property="article:published_time" content="2024-03-01T09:30:00Z">
        </head><body>
        <article><p>First paragraph.</p><p>Second paragraph.</p></article>
        </body></html>"#;

    #[test]
    fn parses_article_fields() {
        let article = parse_page(PAGE).unwrap();
        assert_eq!(article.title, "Rates climb again");
        assert_eq!(article.text, "First paragraph.\n\nSecond paragraph.");
        assert_eq!(article.authors, vec!["A. Reporter".to_string()]);
        assert_eq!(article.publish_date.as_deref(), Some("2024-03-01T09:30:00Z"));
        assert_eq!(article.top_image.as_deref(), Some("https://example.com/lead.jpg"));
        assert_eq!(article.meta_keywords, vec!["rates".to_string(), "economy".to_string()]);
        assert_eq!(article.meta_language, "en");
    }

    #[test]
    fn empty_body_is_no_content() {
        let result = parse_page("<html><head><title>Bare</title></head><body></body></html>");
        assert!(matches!(result, Err(ExtractError::NoContent)));
    }
}

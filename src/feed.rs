//! Topical feed fetch and per-entry processing: headline cleanup, source
//! attribution, deterministic ids and short summaries.

use std::collections::HashMap;
use std::time::Duration;

use feed_rs::model::Entry;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use rand::seq::IndexedRandom;
use regex::Regex;
use reqwest::{header, Client};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::USER_AGENTS;
use crate::headline;
use crate::summary::{self, Summarize, FEED_SUMMARY_LENGTH};
use crate::types::{ExtractError, FeedEntry, FeedOutput, FeedStats, Result};

/// Label reported in the stats block for this feed backend.
pub const FEED_SOURCE_LABEL: &str = "Google News RSS";

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// Known topic sections of the aggregator; anything else goes through the
/// search endpoint. Politics lives under NATION upstream.
fn topic_for_category(category: &str) -> Option<&'static str> {
    match category {
        "world" => Some("WORLD"),
        "business" => Some("BUSINESS"),
        "technology" => Some("TECHNOLOGY"),
        "entertainment" => Some("ENTERTAINMENT"),
        "sports" => Some("SPORTS"),
        "science" => Some("SCIENCE"),
        "health" => Some("HEALTH"),
        "politics" => Some("NATION"),
        _ => None,
    }
}

fn feed_url(category: &str) -> Url {
    let key = category.to_lowercase();
    let mut url = match topic_for_category(&key) {
        Some(topic) => Url::parse(&format!(
            "https://news.google.com/rss/headlines/section/topic/{topic}"
        ))
        .expect("static topic url"),
        None => {
            let mut search =
                Url::parse("https://news.google.com/rss/search").expect("static search url");
            search.query_pairs_mut().append_pair("q", category);
            search
        }
    };
    url.query_pairs_mut()
        .append_pair("hl", "en")
        .append_pair("gl", "US")
        .append_pair("ceid", "US:en");
    url
}

/// One feed entry plus the RSS item fields feed-rs does not surface.
///
/// feed-rs maps `Entry.source` only from the Atom `<source>` element; the
/// RSS 2.0 `<source url="…">Outlet</source>` that aggregator feeds carry
/// is dropped by its parser, and the raw `pubDate` string is replaced by
/// a parsed timestamp. Both are recovered from the item XML directly.
#[derive(Debug)]
pub struct RawFeedItem {
    pub entry: Entry,
    /// Text of the RSS item's `<source>` element, when present.
    pub source_title: Option<String>,
    /// The item's `pubDate` string exactly as the feed carried it.
    pub published_raw: Option<String>,
}

#[derive(Debug, Default)]
struct ItemDetail {
    source_title: Option<String>,
    published_raw: Option<String>,
}

/// Pulls per-item `<source>` text and raw `pubDate` out of RSS 2.0
/// markup, keyed by the item link. Elements outside `<item>` blocks are
/// ignored, so channel-level links and titles do not leak in. Returns an
/// empty map for Atom documents, which have no `<item>` elements.
fn item_details(xml: &str) -> HashMap<String, ItemDetail> {
    let mut reader = Reader::from_str(xml);
    let mut details = HashMap::new();

    let mut in_item = false;
    let mut link: Option<String> = None;
    let mut detail = ItemDetail::default();
    let mut field: Option<&'static str> = None;
    let mut buffer = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => match start.name().as_ref() {
                b"item" => {
                    in_item = true;
                    link = None;
                    detail = ItemDetail::default();
                }
                b"link" if in_item => {
                    field = Some("link");
                    buffer.clear();
                }
                b"source" if in_item => {
                    field = Some("source");
                    buffer.clear();
                }
                b"pubDate" if in_item => {
                    field = Some("pubDate");
                    buffer.clear();
                }
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if field.is_some() {
                    if let Ok(decoded) = text.unescape() {
                        buffer.push_str(&decoded);
                    }
                }
            }
            Ok(Event::End(end)) => match end.name().as_ref() {
                b"item" => {
                    if let Some(link) = link.take() {
                        details.insert(link, std::mem::take(&mut detail));
                    }
                    in_item = false;
                }
                b"link" | b"source" | b"pubDate" if in_item => {
                    if let Some(which) = field.take() {
                        let value = buffer.trim().to_string();
                        if !value.is_empty() {
                            match which {
                                "link" => link = Some(value),
                                "source" => detail.source_title = Some(value),
                                _ => detail.published_raw = Some(value),
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            // feed-rs already accepted the document; a hiccup here only
            // loses the supplementary fields.
            Err(e) => {
                debug!("raw item scan stopped: {}", e);
                break;
            }
            _ => {}
        }
    }

    details
}

/// Parses feed XML into entries paired with their raw RSS item details.
pub fn parse_feed(xml: &str) -> Result<Vec<RawFeedItem>> {
    let feed =
        feed_rs::parser::parse(xml.as_bytes()).map_err(|e| ExtractError::Parse(e.to_string()))?;
    let mut details = item_details(xml);

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let detail = entry
                .links
                .first()
                .and_then(|l| details.remove(l.href.trim()))
                .unwrap_or_default();
            RawFeedItem {
                entry,
                source_title: detail.source_title,
                published_raw: detail.published_raw,
            }
        })
        .collect())
}

/// Fetches aggregator feed entries for one category.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    /// Returns up to `count` raw items. An empty feed is not an error;
    /// it is reported through logs and an empty list.
    pub async fn fetch(&self, category: &str, count: usize) -> Result<Vec<RawFeedItem>> {
        let url = feed_url(category);
        let user_agent = *USER_AGENTS
            .choose(&mut rand::rng())
            .unwrap_or(&USER_AGENTS[0]);

        debug!("fetching feed from: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .header(header::USER_AGENT, user_agent)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::CACHE_CONTROL, "max-age=0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let items = parse_feed(&body)?;

        if items.is_empty() {
            warn!("no entries found for {}", category);
        } else {
            info!("found {} entries for {}", items.len(), category);
        }

        Ok(items.into_iter().take(count).collect())
    }
}

/// Strips HTML tags without validating the markup.
pub fn strip_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, "").trim().to_string()
}

/// Stable content-derived entry id: category-prefixed, 8 hex chars of a
/// hash over `(category, link, title)`. Only accidental collisions within
/// a batch need avoiding.
pub fn entry_id(category: &str, link: &str, title: &str) -> String {
    let digest = Sha256::digest(format!("{category}:{link}:{title}").as_bytes());
    format!("{}-gnews-{}", category.to_lowercase(), &hex::encode(digest)[..8])
}

/// Maps raw feed items into [`FeedEntry`] records, in input order.
/// Items without a usable title or link are skipped entirely.
pub async fn process_entries(
    items: Vec<RawFeedItem>,
    category: &str,
    summarizer: Option<&dyn Summarize>,
) -> Vec<FeedEntry> {
    let mut results = Vec::new();

    for item in items {
        let RawFeedItem {
            entry,
            source_title,
            published_raw,
        } = item;

        let raw_title = entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_else(|| "Untitled".to_string());

        let mut source = headline::extract_source(&raw_title);
        let title = headline::first_headline(&raw_title);
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        if title.is_empty() || link.is_empty() {
            debug!("skipping entry without title or link");
            continue;
        }

        let original_summary = entry
            .summary
            .as_ref()
            .map(|s| strip_tags(&s.content))
            .unwrap_or_default();

        let summary_input = if original_summary.is_empty() {
            raw_title.clone()
        } else {
            original_summary.clone()
        };
        let mut summary =
            summary::ai_summarize(&summary_input, FEED_SUMMARY_LENGTH, summarizer).await;
        if summary.is_empty() {
            summary = headline::first_headline(&summary_input);
        }

        // A structured source element beats the title-suffix heuristic:
        // the RSS item's own <source> text first, then the Atom source
        // feed-rs models.
        let structured = source_title
            .or(entry.source)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(structured) = structured {
            source = structured;
        }

        // The feed's own date string verbatim when the raw scan found
        // it, otherwise re-serialized from the parsed timestamp.
        let published = published_raw.or_else(|| entry.published.map(|dt| dt.to_rfc2822()));

        results.push(FeedEntry {
            id: entry_id(category, &link, &title),
            title,
            link,
            published,
            summary,
            original_summary,
            source,
            extracted: false,
        });
    }

    results
}

/// Assembles the CLI output envelope for one processed feed.
pub fn feed_output(category: &str, entries: Vec<FeedEntry>, summarized: bool) -> FeedOutput {
    FeedOutput {
        success: !entries.is_empty(),
        category: category.to_string(),
        stats: Some(FeedStats {
            total: entries.len(),
            extracted: 0,
            summarized,
            source: FEED_SOURCE_LABEL.to_string(),
        }),
        entries,
        error: None,
    }
}

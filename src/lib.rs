pub mod article;
pub mod extract;
pub mod feed;
pub mod headline;
pub mod normalize;
pub mod summary;
pub mod types;

pub use article::{ArticleFetcher, DownloadedArticle, HttpArticleFetcher};
pub use extract::{Extractor, MIN_CONTENT_TOKENS, USER_AGENTS};
pub use feed::{FeedFetcher, RawFeedItem, FEED_SOURCE_LABEL};
pub use summary::{HttpSummarizer, Summarize};
pub use types::*;

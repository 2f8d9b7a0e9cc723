use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use newswire::{
    feed, Extractor, FeedFetcher, FetchConfig, HttpArticleFetcher, HttpSummarizer, Summarize,
};

#[derive(Parser)]
#[command(name = "newswire", about = "Article extraction and news-feed processing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract one article and print the result as JSON
    Extract {
        url: Option<String>,
    },
    /// Fetch a topical feed and print the processed entries as JSON
    Feed {
        #[arg(default_value = "World")]
        category: String,
        #[arg(default_value_t = 10)]
        count: usize,
    },
}

#[tokio::main]
async fn main() {
    // Stdout carries exactly one JSON object; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Extract { url: None } => {
            error!("no URL provided");
            emit(&json!({ "success": false, "error": "no URL provided" }));
            1
        }
        Command::Extract { url: Some(url) } => run_extract(&url).await,
        Command::Feed { category, count } => run_feed(&category, count).await,
    };

    std::process::exit(exit_code);
}

async fn run_extract(url: &str) -> i32 {
    let fetcher = match HttpArticleFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("could not build HTTP client: {}", e);
            emit(&json!({ "success": false, "error": e.to_string(), "extracted": false }));
            return 1;
        }
    };

    let extractor = Extractor::new(fetcher, FetchConfig::default());
    let result = extractor.extract(url).await;
    emit(&result);
    0
}

async fn run_feed(category: &str, count: usize) -> i32 {
    let summarizer = HttpSummarizer::from_env();
    if summarizer.is_none() {
        info!("no summarizer configured, using heuristic summaries");
    }
    let summarizer_ref: Option<&dyn Summarize> =
        summarizer.as_ref().map(|s| s as &dyn Summarize);

    let config = FetchConfig::default();
    let output = match fetch_and_process(category, count, config, summarizer_ref).await {
        Ok(entries) => feed::feed_output(category, entries, summarizer_ref.is_some()),
        Err(e) => {
            error!("feed fetch failed: {}", e);
            emit(&newswire::FeedOutput {
                success: false,
                category: category.to_string(),
                entries: Vec::new(),
                stats: None,
                error: Some(e.to_string()),
            });
            return 1;
        }
    };

    emit(&output);
    0
}

async fn fetch_and_process(
    category: &str,
    count: usize,
    config: FetchConfig,
    summarizer: Option<&dyn Summarize>,
) -> newswire::Result<Vec<newswire::FeedEntry>> {
    let fetcher = FeedFetcher::new(config.timeout_seconds)?;
    let entries = fetcher.fetch(category, count).await?;
    Ok(feed::process_entries(entries, category, summarizer).await)
}

fn emit(payload: &impl serde::Serialize) {
    match serde_json::to_string(payload) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("could not serialize output: {}", e),
    }
}

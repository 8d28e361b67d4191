//! Sift CLI: stream search results to the terminal as JSON lines.

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use sift_api::SearchClient;
use sift_config::{CliOverrides, SiftConfig};
use sift_types::{ApiError, SearchOptions};
use std::io::{self, Write};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "sift", version, about = "Stream search results from a search API")]
struct Cli {
    /// The search query
    query: String,

    /// Print every server event instead of only search results
    #[arg(long)]
    raw: bool,

    /// Fail on the first malformed or undecodable frame instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Query syntax version
    #[arg(long)]
    syntax_version: Option<String>,

    /// Pattern type (e.g. literal, regexp, structural)
    #[arg(long)]
    pattern_type: Option<String>,

    /// Maximum number of results the server should display
    #[arg(long)]
    display: Option<u32>,

    /// Truncate matched lines to this many characters
    #[arg(long)]
    max_line_len: Option<u32>,

    /// Request chunk matches instead of line matches
    #[arg(long)]
    chunk_matches: bool,

    /// Lines of context around chunk matches (requires --chunk-matches)
    #[arg(long)]
    context_lines: Option<u32>,

    /// Stop after printing this many items
    #[arg(long)]
    limit: Option<usize>,

    /// Streaming search endpoint (overrides SIFT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Access token (overrides SIFT_ACCESS_TOKEN)
    #[arg(long, conflicts_with = "oauth_token")]
    access_token: Option<String>,

    /// OAuth token (overrides SIFT_OAUTH_TOKEN)
    #[arg(long)]
    oauth_token: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    /// Merge command-line options over the configured defaults.
    fn search_options(&self, defaults: SearchOptions) -> SearchOptions {
        SearchOptions {
            version: self.syntax_version.clone().or(defaults.version),
            pattern_type: self.pattern_type.clone().or(defaults.pattern_type),
            display_limit: self.display.or(defaults.display_limit),
            max_line_length: self.max_line_len.or(defaults.max_line_length),
            enable_chunk_matches: self.chunk_matches || defaults.enable_chunk_matches,
            context_lines: self.context_lines.or(defaults.context_lines),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only results
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = SiftConfig::load(CliOverrides {
        base_url: cli.base_url.clone(),
        access_token: cli.access_token.clone(),
        oauth_token: cli.oauth_token.clone(),
        strict: cli.strict.then_some(true),
    })
    .context("Failed to load configuration")?;

    let client =
        SearchClient::new(config.client_config()).context("Failed to create search client")?;
    let options = cli.search_options(config.search.clone());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let count = if cli.raw {
        let stream = client
            .search_raw(&cli.query, &options)
            .await
            .context("Search request failed")?
            .with_cancellation(cancel.clone());
        print_stream(stream, cli.limit).await?
    } else {
        let stream = client
            .search(&cli.query, &options)
            .await
            .context("Search request failed")?
            .with_cancellation(cancel.clone());
        print_stream(stream, cli.limit).await?
    };

    if cancel.is_cancelled() {
        eprintln!("Cancelled after {count} items");
    } else {
        tracing::debug!("Printed {count} items");
    }
    Ok(())
}

/// Print each item as one JSON line. Returns the number printed.
///
/// Returning early drops the stream, which closes the connection.
async fn print_stream<S, T>(mut stream: S, limit: Option<usize>) -> Result<usize>
where
    S: Stream<Item = Result<T, ApiError>> + Unpin,
    T: Serialize,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;

    while limit.is_none_or(|n| count < n) {
        let Some(item) = stream.next().await else {
            break;
        };
        let item = item.map_err(|e| {
            let context = if e.is_local() {
                "Stopped at a bad frame (--strict)"
            } else {
                "Search stream failed"
            };
            anyhow::Error::new(e).context(context)
        })?;
        serde_json::to_writer(&mut out, &item)?;
        writeln!(out)?;
        count += 1;
    }

    out.flush()?;
    Ok(count)
}

//! Doc-Atlas main entry point
//!
//! This is the command-line interface for the Doc-Atlas site mapper.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use doc_atlas::config::{load_config_with_hash, validate, Config};
use doc_atlas::crawler::{Coordinator, CrawlReport};
use doc_atlas::llm::{CompletionClient, GeminiClient};
use doc_atlas::output::{
    write_links_table, write_links_text, write_relevant_pages, write_report_summary,
    write_search_hits, write_tree,
};
use doc_atlas::search::{find_links, select_relevant_pages};
use doc_atlas::tree::{render_markdown, SemanticCategorizer};
use doc_atlas::CacheLayer;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Doc-Atlas: a documentation site mapper
///
/// Doc-Atlas extracts the links of a site's root page, organizes them into a
/// URL-structure tree and an LLM-categorized tree, fetches readable content
/// for the linked pages, and caches everything per domain.
#[derive(Parser, Debug)]
#[command(name = "doc-atlas")]
#[command(version)]
#[command(about = "A documentation site mapper", long_about = None)]
struct Cli {
    /// Root URL of the site to map
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How to print the result
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
    output: OutputFormat,

    /// Find pages relevant to a query instead of printing the site
    #[arg(long)]
    query: Option<String>,

    /// Maximum number of pages whose content is fetched
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum number of keyword search results
    #[arg(long, default_value_t = 5)]
    max_results: usize,

    /// API key for the completion service
    #[arg(long)]
    api_key: Option<String>,

    /// Build the enhanced tree from URL structure only
    #[arg(long)]
    no_llm: bool,

    /// Re-crawl even when the domain is cached
    #[arg(long)]
    refresh: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Text,
    Tree,
    Fasthtml,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
        validate(&config)?;
    }

    let client = build_completion_client(&config, &cli);

    let mut cache = CacheLayer::new(&config.cache.directory);
    if let Some(hash) = config_hash {
        cache = cache.with_config_hash(hash);
    }
    let mut coordinator = Coordinator::new(config)?.with_cache(cache);
    if let Some(client) = &client {
        coordinator = coordinator.with_semantic(SemanticCategorizer::new(Arc::clone(client)));
    }

    let report = coordinator.crawl(&cli.url, cli.refresh).await;
    if let Some(error) = &report.error {
        anyhow::bail!("{}", error);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.query {
        Some(query) => handle_query(&mut out, &report, query, &cli, client.as_deref()).await?,
        None => handle_output(&mut out, &report, cli.output, cli.quiet)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_atlas=info,warn"),
            1 => EnvFilter::new("doc_atlas=debug,info"),
            2 => EnvFilter::new("doc_atlas=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the completion client, or None when the LLM is off or has no key
fn build_completion_client(config: &Config, cli: &Cli) -> Option<Arc<dyn CompletionClient>> {
    if cli.no_llm || !config.llm.enabled {
        tracing::info!("LLM disabled; the enhanced tree mirrors the URL structure");
        return None;
    }

    match GeminiClient::from_config(&config.llm, cli.api_key.as_deref()) {
        Ok(client) => {
            tracing::info!("Using model {}", client.model());
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("{}; continuing without the LLM", e);
            None
        }
    }
}

/// Prints the crawled site in the requested format
fn handle_output(
    out: &mut impl Write,
    report: &CrawlReport,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let bundle = &report.bundle;

    match format {
        OutputFormat::Table => write_links_table(out, &bundle.links)?,
        OutputFormat::Text => write_links_text(out, &bundle.links)?,
        OutputFormat::Tree => {
            writeln!(out, "Enhanced tree:\n")?;
            write_tree(out, &bundle.enhanced_tree)?;
            writeln!(out, "\nConventional tree:\n")?;
            write_tree(out, &bundle.conventional_tree)?;
        }
        OutputFormat::Fasthtml => {
            let dir = report
                .cache_dir
                .as_ref()
                .context("The crawl result was not cached")?;
            let path = dir.join(doc_atlas::cache::FASTHTML_FILE);
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            writeln!(out, "{}", document)?;
        }
    }

    if !quiet {
        writeln!(out)?;
        write_report_summary(out, report)?;
        if let Some(dir) = &report.cache_dir {
            writeln!(out, "\nCache: {}", dir.display())?;
        }
    }

    Ok(())
}

/// Answers a query from the crawled bundle
///
/// A model picks pages from the enhanced tree when one is configured;
/// otherwise a keyword search runs over both trees.
async fn handle_query(
    out: &mut impl Write,
    report: &CrawlReport,
    query: &str,
    cli: &Cli,
    client: Option<&dyn CompletionClient>,
) -> anyhow::Result<()> {
    let bundle = &report.bundle;

    match client {
        Some(client) => {
            let tree_markdown = render_markdown(&bundle.enhanced_tree);
            let pages = select_relevant_pages(client, &tree_markdown, query).await;
            write_relevant_pages(out, &pages, bundle, query)?;
        }
        None => {
            let hits = find_links(bundle, query, cli.max_results);
            write_search_hits(out, &hits, bundle, query)?;
        }
    }

    Ok(())
}

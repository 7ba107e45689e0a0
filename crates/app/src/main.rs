use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use workspace_assistant_core::{
    index_directory, EnrichmentCoordinator, EnrichmentOptions, FileCatalog, FileListing,
    FormatExtractor, IndexOptions, OpenAiEnricher, SearchHit, SqliteCatalog,
    DEFAULT_CATALOG_PATH,
};

#[derive(Parser)]
#[command(
    name = "workspace-assistant",
    version,
    about = "AI Workspace Assistant: file indexing, organization and AI summaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Catalog database file
    #[arg(long, env = "WORKSPACE_DB", default_value = DEFAULT_CATALOG_PATH, global = true)]
    db: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Index all files within a directory.
    Index {
        /// Directory to scan recursively.
        #[arg(long)]
        path: PathBuf,
        /// Follow symbolic links while walking.
        #[arg(long, default_value_t = false)]
        follow_links: bool,
    },
    /// List indexed files, newest first.
    List {
        /// Max results to show.
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Search indexed files by name, summary or content.
    Search {
        /// Query string.
        #[arg(long = "q")]
        query: String,
    },
    /// Generate summaries for indexed files that lack one.
    Summarize {
        /// Max files to summarize.
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Also assign a category to each summarized file.
        #[arg(long, default_value_t = false)]
        classify: bool,
        /// Category vocabulary used with --classify.
        #[arg(long = "label", value_delimiter = ',')]
        labels: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "workspace-assistant boot"
    );

    match cli.command {
        Command::Index { path, follow_links } => {
            let catalog = open_catalog(&cli.db)?;
            println!("Indexing directory: {}", path.display());

            let options = IndexOptions { follow_links };
            let count = index_directory(&catalog, &FormatExtractor, &path, &options)
                .with_context(|| format!("failed to index {}", path.display()))?;

            println!("Indexed {count} files successfully.");
        }
        Command::List { limit } => {
            let catalog = open_catalog(&cli.db)?;
            let files = catalog.list_files(limit)?;
            print_listing(&files, limit);
        }
        Command::Search { query } => {
            let catalog = open_catalog(&cli.db)?;
            let hits = catalog.search_files(&query)?;

            if hits.is_empty() {
                println!("No results found.");
            } else {
                print_hits(&hits, &query);
            }
        }
        Command::Summarize {
            limit,
            classify,
            labels,
        } => {
            let enricher = OpenAiEnricher::from_env()
                .context("summaries need a configured text-generation provider")?;
            let catalog = open_catalog(&cli.db)?;

            println!("Generating summaries...");
            let coordinator = EnrichmentCoordinator::with_options(
                enricher,
                EnrichmentOptions { classify, labels },
            );
            let report = coordinator.summarize_pending(&catalog, limit).await?;

            if report.nothing_pending() {
                println!("All files already summarized!");
                return Ok(());
            }

            for failure in &report.failures {
                warn!(id = failure.id, reason = %failure.reason, "enrichment failed");
                println!("  failed id={}: {}", failure.id, failure.reason);
            }

            println!(
                "Summaries generated and saved! summarized={} classified={} failed={}",
                report.summarized,
                report.classified,
                report.failures.len()
            );
        }
    }

    Ok(())
}

fn open_catalog(path: &Path) -> anyhow::Result<SqliteCatalog> {
    SqliteCatalog::open(path)
        .with_context(|| format!("failed to open catalog at {}", path.display()))
}

fn print_listing(files: &[FileListing], limit: usize) {
    println!("Indexed Files (showing {limit} max)");
    println!("{:>6}  {:<32}  {:>10}  {:<10}  Path", "ID", "Name", "Size", "Category");

    for file in files {
        println!(
            "{:>6}  {:<32}  {:>10}  {:<10}  {}",
            file.id,
            clip(&file.name, 32),
            file.size,
            file.category.as_deref().unwrap_or("None"),
            file.path
        );
    }
}

fn print_hits(hits: &[SearchHit], query: &str) {
    println!("Search Results for '{query}'");
    println!("{:>6}  {:<32}  {:<48}  Path", "ID", "Name", "Summary");

    for hit in hits {
        let summary = hit
            .summary
            .as_deref()
            .and_then(|summary| summary.lines().find(|line| !line.trim().is_empty()))
            .unwrap_or("");

        println!(
            "{:>6}  {:<32}  {:<48}  {}",
            hit.id,
            clip(&hit.name, 32),
            clip(summary.trim(), 48),
            hit.path
        );
    }
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }

    let mut clipped: String = value.chars().take(width.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::{clip, Cli, Command};
    use clap::Parser;

    #[test]
    fn clip_keeps_short_values() {
        assert_eq!(clip("notes.md", 32), "notes.md");
        assert_eq!(clip("abcdefghij", 6), "abc...");
    }

    #[test]
    fn summarize_accepts_label_list() {
        let cli = Cli::try_parse_from([
            "workspace-assistant",
            "summarize",
            "--limit",
            "3",
            "--classify",
            "--label",
            "work,personal",
        ])
        .expect("arguments should parse");

        match cli.command {
            Command::Summarize {
                limit,
                classify,
                labels,
            } => {
                assert_eq!(limit, 3);
                assert!(classify);
                assert_eq!(labels, vec!["work", "personal"]);
            }
            _ => panic!("expected summarize"),
        }
    }

    #[test]
    fn search_uses_q_flag() {
        let cli = Cli::try_parse_from(["workspace-assistant", "--db", "x.db", "search", "--q", "hello"])
            .expect("arguments should parse");
        assert_eq!(cli.db.to_str(), Some("x.db"));
        assert!(matches!(cli.command, Command::Search { query } if query == "hello"));
    }
}

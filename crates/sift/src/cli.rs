//! Command-line interface for the sift search engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};

use sift::{
    AddOptions, Config, Error, GetOptions, SearchIndex, SearchOptions, SearchResponse,
};

/// Embedded full-text search over structured text documents.
#[derive(Debug, Parser)]
#[command(name = "sift", version, about)]
pub struct Cli {
    /// Path to a sift.toml configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Index directory (overrides the configured db_path).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Index a file or directory.
    Add {
        /// File or directory to index.
        path: PathBuf,
        /// Tag(s) to attach to every indexed document.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Re-index documents even when already stored.
        #[arg(long)]
        update: bool,
        /// Do not descend into subdirectories.
        #[arg(long)]
        no_recursive: bool,
        /// Additional exclusion globs.
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Query the index.
    Search {
        /// Query in the sift query language.
        query: String,
        /// Maximum documents returned.
        #[arg(long)]
        limit: Option<usize>,
        /// Restrict to documents carrying one of these tags.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Also report the total match count.
        #[arg(long)]
        count: bool,
        /// Skip snippet extraction.
        #[arg(long)]
        no_snippets: bool,
    },

    /// Print a stored document.
    Get {
        /// Document path.
        path: String,
        /// Body window start (bytes).
        #[arg(long)]
        position: Option<usize>,
        /// Body window length (bytes).
        #[arg(long, default_value_t = 5000)]
        length: usize,
    },

    /// Print one section of a document.
    Heading {
        /// Document path.
        path: String,
        /// Section id (e.g. "s2").
        id: String,
    },

    /// Remove documents by path or tag.
    Rm {
        /// Document path to remove.
        path: Option<String>,
        /// Remove every document carrying this tag instead.
        #[arg(long)]
        tag: Option<String>,
    },

    /// Remove all documents.
    Clear,

    /// Show document and tag counts.
    Stats {
        /// Restrict to documents carrying this tag.
        #[arg(long)]
        tag: Option<String>,
    },
}

/// Loads configuration and applies CLI overrides.
fn load_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    Ok(config)
}

/// Runs the parsed command.
pub fn run(cli: &Cli) -> Result<(), Error> {
    let config = load_config(cli)?;
    let mut index = SearchIndex::open(config)?;

    match &cli.command {
        Commands::Add {
            path,
            tags,
            update,
            no_recursive,
            exclude,
        } => {
            let mut options = AddOptions {
                tags: tags.clone(),
                update: *update,
                recursive: !no_recursive,
                ..AddOptions::default()
            };
            options.exclude.extend(exclude.iter().cloned());

            let stats = index.add(path, &options)?;
            println!(
                "indexed {}, skipped {}, failed {}",
                stats.indexed, stats.skipped, stats.failed
            );
            for (path, message) in &stats.errors {
                eprintln!("  {}: {}", path.display(), message);
            }
            Ok(())
        }

        Commands::Search {
            query,
            limit,
            tags,
            count,
            no_snippets,
        } => {
            let mut options = SearchOptions {
                tags: tags.clone(),
                count: *count,
                snippets: !no_snippets,
                ..index.search_options()
            };
            if let Some(limit) = limit {
                options.limit = *limit;
            }

            let response = index.search(query, &options)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_results(&index, &response)?;
            }
            Ok(())
        }

        Commands::Get {
            path,
            position,
            length,
        } => {
            let options = GetOptions {
                position: *position,
                length: *length,
            };
            match index.get(path, &options)? {
                Some(record) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                Some(record) => println!("{}", record.body()),
                None => println!("not found: {path}"),
            }
            Ok(())
        }

        Commands::Heading { path, id } => {
            match index.get_heading_by_id(path, id)? {
                Some(detail) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(&detail)?);
                }
                Some(detail) => {
                    println!(
                        "{} {} (depth {}, {} blocks)",
                        detail.section.id,
                        detail.section.text,
                        detail.section.depth,
                        detail.content_count
                    );
                    for block in &detail.section.content {
                        println!("\n{}", block.text);
                    }
                }
                None => println!("not found: {path}#{id}"),
            }
            Ok(())
        }

        Commands::Rm { path, tag } => {
            match (path, tag) {
                (Some(path), None) => {
                    let removed = index.remove_document(path)?;
                    println!("{}", if removed { "removed" } else { "not found" });
                }
                (None, Some(tag)) => {
                    let removed = index.remove_by_tag(tag)?;
                    println!("removed {removed} document(s)");
                }
                _ => eprintln!("rm needs a path or --tag"),
            }
            Ok(())
        }

        Commands::Clear => {
            index.clear()?;
            println!("cleared");
            Ok(())
        }

        Commands::Stats { tag } => {
            let stats = index.stats(tag.as_deref())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("documents: {}", stats.documents);
                println!("sections: {}", stats.sections);
                for (tag, count) in &stats.by_tag {
                    println!("  #{tag}: {count}");
                }
            }
            Ok(())
        }
    }
}

/// Prints search results as a table plus breadcrumbs.
fn print_results(index: &SearchIndex, response: &SearchResponse) -> Result<(), Error> {
    if response.results.is_empty() {
        println!("no results");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["rank", "field", "section", "snippet", "document"]);

    for snippet in &response.results {
        let crumbs = snippet.breadcrumbs_text(index, None)?;
        table.add_row(vec![
            format!("{:.2}", snippet.rank),
            snippet.field.to_string(),
            crumbs,
            truncate(&snippet.text, 60),
            snippet.document_path.clone(),
        ]);
    }
    println!("{table}");

    if let Some(total) = response.total_count {
        println!("{total} matching document(s)");
    }
    Ok(())
}

/// Truncates display text to `max` chars with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}…")
}

pub mod config;
pub mod search;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use once_cell::sync::Lazy;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

use config::SearchConfig;
use search::api::{self, QueryRequest, QueryResponse};
use search::engine::{SearchEngine, SearchPath};

/// Queries run by `blogsearch demo`.
pub const DEMO_QUERIES: [&str; 5] = [
    "technology",
    "data",
    "glific",
    "artificial intelligence",
    "development",
];

static LONG_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{} (built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    )
});

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "blogsearch",
    version,
    about = "Embedding-based keyword search over a directory of blog posts"
)]
pub struct Cli {
    /// Word embedding table (word2vec text or binary, or GloVe-style text)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Directory of blog post files
    #[arg(long, global = true)]
    pub docs: Option<PathBuf>,

    /// Document file extension, without the dot
    #[arg(long, global = true)]
    pub extension: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the indexed blog posts
    Search {
        /// Query words
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show index and vocabulary statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Print a sample of the embedding vocabulary
    Vocab {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Suggest query words from the vocabulary
    Suggest {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Run a fixed set of example queries concurrently
    Demo {
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Read queries from stdin until `quit`
    Interactive {
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    /// Environment-derived config with command-line overrides applied.
    pub fn config(&self) -> SearchConfig {
        let mut config = SearchConfig::from_env();
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(docs) = &self.docs {
            config.docs_dir = docs.clone();
        }
        if let Some(ext) = &self.extension {
            let ext = ext.trim().trim_start_matches('.');
            if !ext.is_empty() {
                config.extension = ext.to_string();
            }
        }
        config
    }
}

pub fn command() -> clap::Command {
    Cli::command().long_version(LONG_VERSION.as_str())
}

pub async fn run() -> Result<()> {
    let cli = Cli::from_arg_matches(&command().get_matches())?;
    let config = cli.config();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = command();
            clap_complete::generate(shell, &mut cmd, "blogsearch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Search { query, top_k, json } => {
            let engine = open_engine(config).await?;
            let top_k = top_k.unwrap_or(engine.config().top_k);
            run_search(&engine, &query.join(" "), top_k, json)
        }
        Commands::Stats { json } => {
            let engine = open_engine(config).await?;
            run_stats(&engine, json)
        }
        Commands::Vocab { limit } => {
            for word in open_engine(config).await?.vocabulary_sample(limit) {
                println!("{word}");
            }
            Ok(())
        }
        Commands::Suggest { limit } => {
            for word in open_engine(config).await?.suggestions(limit) {
                println!("{word}");
            }
            Ok(())
        }
        Commands::Demo { top_k } => {
            let engine = open_engine(config).await?;
            let top_k = top_k.unwrap_or(engine.config().top_k);
            run_demo(engine, top_k).await
        }
        Commands::Interactive { top_k } => {
            let engine = open_engine(config).await?;
            let top_k = top_k.unwrap_or(engine.config().top_k);
            run_interactive(&engine, top_k).await
        }
    }
}

/// Load the table and index the corpus off the async runtime.
async fn open_engine(config: SearchConfig) -> Result<Arc<SearchEngine>> {
    let engine = tokio::task::spawn_blocking(move || SearchEngine::open(config))
        .await
        .context("engine startup task panicked")??;
    Ok(Arc::new(engine))
}

fn run_search(engine: &SearchEngine, query: &str, top_k: usize, json: bool) -> Result<()> {
    let response = api::handle_query(Some(engine), QueryRequest::new(query).with_top_k(top_k))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

fn run_stats(engine: &SearchEngine, json: bool) -> Result<()> {
    let report = api::stats_report(Some(engine))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Blog search statistics".bold().underline());
    println!("  documents:           {}", report.document_count.to_string().bold());
    println!("  with embeddings:     {}", report.indexed_documents);
    println!("  vocabulary size:     {}", report.vocabulary_size.to_string().bold());
    println!("  embedding dimension: {}", report.embedding_dimension);
    println!("  sample vocabulary:   {}", report.sample_vocabulary.join(", "));
    println!("  sample documents:    {}", report.sample_documents.join(", "));
    Ok(())
}

async fn run_demo(engine: Arc<SearchEngine>, top_k: usize) -> Result<()> {
    let started = tokio::time::Instant::now();
    let handles: Vec<_> = DEMO_QUERIES
        .iter()
        .map(|&query| {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || {
                api::handle_query(Some(&engine), QueryRequest::new(query).with_top_k(top_k))
            })
        })
        .collect();

    for (query, handle) in DEMO_QUERIES.iter().zip(handles) {
        match handle.await.context("demo query task panicked")? {
            Ok(response) => print_response(&response),
            Err(e) => println!("{} {query:?}: {e}", "error".red().bold()),
        }
    }
    info!(
        queries = DEMO_QUERIES.len(),
        elapsed_ms = %started.elapsed().as_millis(),
        "demo complete"
    );
    Ok(())
}

async fn run_interactive(engine: &SearchEngine, top_k: usize) -> Result<()> {
    println!(
        "{} Type a query, {} for a vocabulary sample, {} to exit.",
        "blogsearch".bold(),
        "vocab".cyan(),
        "quit".cyan()
    );
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "search>".green().bold());
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("read query from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "vocab" => {
                let sample = engine.vocabulary_sample(engine.config().vocab_sample);
                println!("{}", sample.join(", "));
            }
            query => match api::handle_query(Some(engine), QueryRequest::new(query).with_top_k(top_k)) {
                Ok(response) => print_response(&response),
                Err(e) => {
                    warn!(query = %query, error = %e, "query rejected");
                    println!("{} {e}", "error".red().bold());
                }
            },
        }
    }
    Ok(())
}

fn print_response(response: &QueryResponse) {
    let path = match response.search_path {
        SearchPath::Semantic => "semantic".green(),
        SearchPath::Fallback => "literal fallback".yellow(),
    };
    println!(
        "\n{} {} ({}, {} found)",
        "Results for".bold(),
        format!("{:?}", response.query).cyan(),
        path,
        response.total_found
    );
    if response.results.is_empty() {
        println!("  {}", "no matching posts".dimmed());
        return;
    }

    for (rank, item) in response.results.iter().enumerate() {
        let meta = &item.metadata;
        println!(
            "{:>3}. {}  {}",
            rank + 1,
            meta.title.bold(),
            format!("[{:.4}]", item.score).dimmed()
        );
        println!(
            "     {} · {} · {}",
            item.identifier,
            meta.author,
            meta.category
        );
        if !meta.url.is_empty() {
            println!("     {}", meta.url.blue().underline());
        }
        println!("     {}", single_line(&meta.content_preview).dimmed());
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

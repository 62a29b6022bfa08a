//! `pdfseek`: ingest a directory of PDF and text files, then query it.
//!
//! ```bash
//! pdfseek query ./papers "solar charge controller" --top-k 3
//! pdfseek repl ./papers
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use pdfseek_cli::{loader, render};
use pdfseek_core::config::Config;
use pdfseek_embed::get_default_embedder;
use pdfseek_hybrid::{HybridSearchEngine, IngestStatus};

#[derive(Parser)]
#[command(name = "pdfseek", version, about = "Hybrid lexical and semantic passage search over a folder of documents")]
struct Cli {
    /// Directory holding `config.toml` and its per-environment overlays.
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index DIR and run a single query.
    Query {
        dir: PathBuf,
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Index DIR, then answer queries read from stdin, one per line.
    Repl {
        dir: PathBuf,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let env_name = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let settings = Config::load_from(&cli.config_dir, &env_name)?.settings()?;
    let default_top_k = settings.search.default_top_k;
    let embedder = get_default_embedder(&settings.embedding)?;
    let engine = Arc::new(HybridSearchEngine::new(settings, embedder)?);

    match cli.command {
        Commands::Query { dir, query, top_k, json } => {
            ingest(&engine, &dir).await?;
            let results = engine.search(&query, top_k.unwrap_or(default_top_k))?;
            if json { println!("{}", render::to_json(&results)?); } else { print!("{}", render::format_results(&query, &results)); }
        }
        Commands::Repl { dir, top_k } => {
            ingest(&engine, &dir).await?;
            let top_k = top_k.unwrap_or(default_top_k);
            let mut stdout = tokio::io::stdout();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
                let Some(line) = lines.next_line().await? else { break };
                let query = line.trim();
                if query.is_empty() { continue; }
                if query == ":quit" || query == ":q" { break; }
                let results = engine.search_or_empty(query, top_k);
                stdout.write_all(render::format_results(query, &results).as_bytes()).await?;
            }
        }
    }
    Ok(())
}

async fn ingest(engine: &Arc<HybridSearchEngine>, dir: &Path) -> Result<()> {
    let docs = loader::load_directory(dir)?;
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Indexing {} documents from {}", docs.len(), dir.display()));

    let mut status = engine.subscribe();
    let watcher = {
        let pb = pb.clone();
        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let current = status.borrow_and_update().clone();
                if let IngestStatus::Processing { total } = current {
                    pb.set_message(format!("Chunking and embedding {total} documents"));
                }
            }
        })
    };
    let outcome = engine.spawn_ingest(docs).await?;
    watcher.abort();
    pb.finish_and_clear();

    let added = outcome?;
    match engine.status() {
        IngestStatus::Complete { message, .. } => eprintln!("✅ {message}"),
        other => eprintln!("{other:?}"),
    }
    eprintln!("📊 {} documents, {} chunks indexed", engine.document_count(), engine.chunk_count());
    if added == 0 { eprintln!("⚠️  No readable text found in {}", dir.display()); }
    Ok(())
}

use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_tutor_core::{discover_supported_files, TutorEngine};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-tutor", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path of the knowledge store file.
    #[arg(long, env = "DOC_TUTOR_STORE", default_value = "knowledge_store.json")]
    store: String,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a file, a folder of files, a URL, or inline text.
    Add {
        /// File or folder to ingest (txt, pdf, docx, pptx).
        #[arg(long, conflicts_with_all = ["url", "text"])]
        path: Option<String>,
        /// URL to download and ingest.
        #[arg(long, conflicts_with = "text")]
        url: Option<String>,
        /// Inline text to ingest (requires --title).
        #[arg(long, requires = "title")]
        text: Option<String>,
        /// Document title; derived from the source when omitted.
        #[arg(long)]
        title: Option<String>,
    },
    /// List stored documents.
    List,
    /// Remove a document by id.
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Rank stored documents against a query.
    Search {
        #[arg(long)]
        query: String,
        /// Number of documents to return.
        #[arg(long, default_value = "3")]
        max_results: usize,
    },
    /// Print the retrieval context block for a query.
    Context {
        #[arg(long)]
        query: String,
    },
    /// Answer a question from the stored documents.
    Ask {
        #[arg(long)]
        question: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let engine = TutorEngine::open(&cli.store)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        store = %cli.store,
        started_at = %Utc::now().to_rfc3339(),
        "doc-tutor boot"
    );

    match cli.command {
        Command::Add {
            path,
            url,
            text,
            title,
        } => {
            if let Some(text) = text {
                let title =
                    title.ok_or_else(|| anyhow::anyhow!("--text requires --title"))?;
                let receipt = engine.ingest_text(&text, &title)?;
                println!(
                    "ingested \"{}\" id={} chunks={}",
                    receipt.title, receipt.document_id, receipt.chunks_count
                );
            } else if let Some(url) = url {
                let receipt = engine.ingest_url(&url, title.as_deref())?;
                println!(
                    "ingested \"{}\" id={} chunks={}",
                    receipt.title, receipt.document_id, receipt.chunks_count
                );
            } else if let Some(path) = path {
                ingest_path(&engine, Path::new(&path), title.as_deref())?;
            } else {
                anyhow::bail!("pass one of --path, --url, or --text");
            }
        }
        Command::List => {
            let summaries = engine.list_documents();
            if summaries.is_empty() {
                println!("no documents stored");
            }
            for summary in summaries {
                println!(
                    "{} \"{}\" source={} type={} chunks={} keywords={}",
                    summary.id,
                    summary.title,
                    summary.source,
                    summary.content_type,
                    summary.chunks_count,
                    summary.keywords_count
                );
            }
        }
        Command::Remove { id } => {
            if engine.remove_document(&id) {
                println!("removed {id}");
            } else {
                println!("no document with id {id}");
            }
        }
        Command::Search { query, max_results } => {
            let results = engine.search(&query, max_results);
            if results.is_empty() {
                println!("no matches");
            }
            for result in results {
                println!(
                    "score={} \"{}\" id={} source={}",
                    result.relevance_score, result.title, result.document_id, result.source
                );
                for chunk in result.matching_chunks {
                    println!("  [chunk {} score={}]\n  {}", chunk.chunk_index, chunk.relevance, chunk.content);
                }
            }
        }
        Command::Context { query } => {
            println!("{}", engine.get_context(&query));
        }
        Command::Ask { question } => {
            println!("{}", engine.answer(&question));
        }
    }

    Ok(())
}

/// Ingests a single file, or every supported file under a folder. Per-file
/// failures inside a folder are logged and skipped so one bad file does not
/// abort the batch.
fn ingest_path(engine: &TutorEngine, path: &Path, title: Option<&str>) -> anyhow::Result<()> {
    if path.is_dir() {
        let files = discover_supported_files(path);
        if files.is_empty() {
            println!("no supported files under {}", path.display());
            return Ok(());
        }

        let mut ingested = 0usize;
        for file in files {
            match ingest_file(engine, &file, None) {
                Ok(()) => ingested += 1,
                Err(error) => {
                    warn!(path = %file.display(), %error, "skipped file");
                }
            }
        }
        println!("ingested {ingested} file(s) from {}", path.display());
        return Ok(());
    }

    ingest_file(engine, path, title)
}

fn ingest_file(engine: &TutorEngine, path: &Path, title: Option<&str>) -> anyhow::Result<()> {
    let bytes = fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");
    let receipt = engine.ingest_file(&bytes, filename, title)?;
    println!(
        "ingested \"{}\" id={} chunks={} bytes={}",
        receipt.title,
        receipt.document_id,
        receipt.chunks_count,
        receipt.file_size.unwrap_or_default()
    );
    Ok(())
}

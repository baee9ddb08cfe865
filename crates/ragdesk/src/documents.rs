//! Document commands: ingest, search, get, and list.
//!
//! Wires the SQLite store and vector index into a [`RetrievalEngine`] and
//! exposes the CLI entry points. The HTTP server builds its engine through
//! the same [`build_engine`].

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

use ragdesk_core::{DocId, DocumentStore, IndexWrite, RetrievalEngine, SearchResult};

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::extract::extract_text;
use crate::sqlite_store::{SqliteDocumentStore, SqliteVectorIndex};
use crate::timeout::TimeoutIndex;

/// The engine as assembled by the application.
pub type Engine = RetrievalEngine<SqliteDocumentStore, TimeoutIndex<SqliteVectorIndex>>;

/// Build the production engine over `pool` using the `[embedding]` and
/// `[retrieval]` settings.
pub fn build_engine(config: &Config, pool: SqlitePool) -> Result<Engine> {
    let embedder = create_embedder(&config.embedding)?;
    let index = TimeoutIndex::new(
        SqliteVectorIndex::new(pool.clone(), embedder),
        Duration::from_millis(config.retrieval.index_timeout_ms),
    );
    Ok(RetrievalEngine::new(SqliteDocumentStore::new(pool), index))
}

/// Resolve the title and content for `ragdesk ingest`.
///
/// With `--file`, content comes from [`extract_text`] and the title falls
/// back to the file stem.
pub fn resolve_input(
    title: Option<String>,
    content: Option<String>,
    file: Option<&Path>,
) -> Result<(String, String)> {
    let (title, content) = match (content, file) {
        (Some(content), None) => (title, content),
        (None, Some(path)) => {
            let text = extract_text(path)?;
            let title = title.or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            });
            (title, text)
        }
        (Some(_), Some(_)) => bail!("pass either --content or --file, not both"),
        (None, None) => bail!("one of --content or --file is required"),
    };

    let title = title.unwrap_or_default();
    if title.trim().is_empty() {
        bail!("title must not be empty");
    }
    Ok((title, content))
}

pub async fn run_ingest(
    config: &Config,
    title: Option<String>,
    content: Option<String>,
    file: Option<&Path>,
) -> Result<()> {
    let (title, content) = resolve_input(title, content, file)?;

    let pool = db::connect(config).await?;
    let engine = build_engine(config, pool.clone())?;
    let ingestion = engine
        .ingest(&title, &content)
        .await
        .context("failed to store document")?;
    pool.close().await;

    println!(
        "Ingested document {}: {}",
        ingestion.document.id, ingestion.document.title
    );
    match ingestion.index {
        IndexWrite::Indexed => println!("  vector index: indexed"),
        IndexWrite::Skipped => println!("  vector index: skipped (embeddings disabled)"),
        IndexWrite::Failed(ref e) => println!("  vector index: failed ({})", e),
    }
    Ok(())
}

pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let engine = build_engine(config, pool.clone())?;
    let results = engine
        .search(query, top_k.unwrap_or(config.retrieval.top_k))
        .await;
    pool.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result);
    }
    Ok(())
}

fn print_result(rank: usize, result: &SearchResult) {
    let title = if result.title.is_empty() {
        "(untitled)"
    } else {
        &result.title
    };
    println!("{}. [{:.2}] {}", rank, result.score, title);
    println!("    path: {}", result.path);
    println!("    excerpt: \"{}\"", excerpt(&result.content, 200));
    println!("    id: {}", result.id);
    println!();
}

/// First `max_chars` characters of `text` on one line.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat.to_string(),
    }
}

pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteDocumentStore::new(pool.clone());
    let doc = store.get(DocId(id)).await?;
    pool.close().await;

    let doc = match doc {
        Some(d) => d,
        None => {
            eprintln!("Error: document not found: {}", id);
            std::process::exit(1);
        }
    };

    println!("--- Document ---");
    println!("id:    {}", doc.id);
    println!("title: {}", doc.title);
    println!();
    println!("--- Content ---");
    println!("{}", doc.content);
    Ok(())
}

pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let docs = SqliteDocumentStore::new(pool.clone()).all().await?;
    pool.close().await;

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!("{:<6} TITLE", "ID");
    for doc in &docs {
        println!("{:<6} {}", doc.id.to_string(), doc.title);
    }
    Ok(())
}

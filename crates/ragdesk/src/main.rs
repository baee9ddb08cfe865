//! # ragdesk CLI
//!
//! ```bash
//! ragdesk --config ./config/ragdesk.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragdesk init` | Create the SQLite database and run schema migrations |
//! | `ragdesk ingest --title T --content C` | Store a document and index it |
//! | `ragdesk ingest --file guide.md` | Ingest a Markdown, text, or PDF file |
//! | `ragdesk search "<query>"` | Hybrid search |
//! | `ragdesk get <id>` | Print one document |
//! | `ragdesk list` | List documents |
//! | `ragdesk questions record\|list\|stats` | Question analytics |
//! | `ragdesk serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ragdesk::analytics::{self, NewQuestion};
use ragdesk::{config, documents, logging, migrate, server};

/// ragdesk: hybrid document retrieval with question analytics.
#[derive(Parser)]
#[command(name = "ragdesk", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragdesk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents, vector_entries,
    /// and questions tables. Safe to run more than once.
    Init,

    /// Store a document and mirror it into the vector index.
    Ingest {
        /// Document title. Defaults to the file stem with `--file`.
        #[arg(long, required_unless_present = "file")]
        title: Option<String>,

        /// Inline document content.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read content from a .md, .txt, or .pdf file.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Search stored documents.
    Search {
        query: String,

        /// Maximum number of results. Defaults to `[retrieval].top_k`.
        #[arg(long)]
        top_k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a document by id.
    Get { id: i64 },

    /// List all documents.
    List,

    /// Question analytics.
    Questions {
        #[command(subcommand)]
        action: QuestionAction,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum QuestionAction {
    /// Record a question and classify it.
    Record {
        #[arg(long)]
        user: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: Option<String>,
        /// Tool used to answer the question.
        #[arg(long)]
        tool: Option<String>,
    },
    /// List recorded questions.
    List {
        #[arg(long)]
        user: Option<String>,
    },
    /// Print aggregate stats as JSON.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(&cfg.logging)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            title,
            content,
            file,
        } => {
            documents::run_ingest(&cfg, title, content, file.as_deref()).await?;
        }
        Commands::Search { query, top_k, json } => {
            documents::run_search(&cfg, &query, top_k, json).await?;
        }
        Commands::Get { id } => {
            documents::run_get(&cfg, id).await?;
        }
        Commands::List => {
            documents::run_list(&cfg).await?;
        }
        Commands::Questions { action } => match action {
            QuestionAction::Record {
                user,
                question,
                answer,
                tool,
            } => {
                let new = NewQuestion {
                    username: user,
                    question,
                    answer,
                    used_tool: tool,
                };
                analytics::run_record(&cfg, new).await?;
            }
            QuestionAction::List { user } => {
                analytics::run_list(&cfg, user.as_deref()).await?;
            }
            QuestionAction::Stats => {
                analytics::run_stats(&cfg).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

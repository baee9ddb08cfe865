//! # ragdesk
//!
//! **A small retrieval-augmented assistant backend.**
//!
//! ragdesk stores documents in SQLite, mirrors them into a vector index
//! when an embedding provider is configured, and answers queries with
//! semantic search that falls back to literal keyword ranking. It also
//! records the questions users ask and tags them with an LLM classifier.
//!
//! ## Architecture
//!
//! ```text
//!                ┌───────────────────────────┐
//!   CLI ────────▶│      RetrievalEngine      │◀──────── HTTP
//!  (ragdesk)     │     (ragdesk-core)        │        (axum)
//!                └──────┬─────────────┬──────┘
//!                       ▼             ▼
//!              ┌──────────────┐ ┌──────────────────┐
//!              │  documents   │ │  vector_entries  │
//!              │ (source of   │ │ (best-effort,    │
//!              │   truth)     │ │  timeout-bound)  │
//!              └──────────────┘ └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool |
//! | [`migrate`] | Idempotent schema creation |
//! | [`sqlite_store`] | SQLite `DocumentStore` and `VectorIndex` |
//! | [`embedding`] | Embedding providers: hash, OpenAI, Ollama |
//! | [`timeout`] | Deadline wrapper for vector index calls |
//! | [`documents`] | Engine assembly and document commands |
//! | [`extract`] | Text extraction from Markdown, text, and PDF files |
//! | [`classifier`] | LLM question tagging |
//! | [`analytics`] | Question records and aggregate stats |
//! | [`server`] | JSON HTTP API |
//! | [`logging`] | `tracing` subscriber setup |

pub mod analytics;
pub mod classifier;
pub mod config;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod extract;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod timeout;

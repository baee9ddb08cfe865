//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (version, vector index readiness) |
//! | `POST` | `/documents` | Ingest a document (`201`) |
//! | `GET`  | `/documents` | List all documents |
//! | `GET`  | `/documents/{id}` | Fetch one document |
//! | `POST` | `/search` | Hybrid search |
//! | `POST` | `/questions` | Record a question (`201`) |
//! | `GET`  | `/questions` | List questions, `?username=` filters |
//! | `GET`  | `/questions/stats` | Aggregate question stats |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "title must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use ragdesk_core::{DocId, Document, DocumentStore, Ingestion, SearchResult, VectorIndex};

use crate::analytics::{
    list_questions, record_question, stats_summary, NewQuestion, QuestionRecord, QuestionStats,
};
use crate::classifier::{create_classifier, QuestionClassifier};
use crate::config::Config;
use crate::db;
use crate::documents::{build_engine, Engine};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
    pool: SqlitePool,
    classifier: Arc<dyn QuestionClassifier>,
    default_top_k: usize,
}

impl AppState {
    pub fn new(config: &Config, pool: SqlitePool) -> anyhow::Result<Self> {
        Ok(Self {
            engine: Arc::new(build_engine(config, pool.clone())?),
            classifier: create_classifier(&config.classifier)?,
            pool,
            default_top_k: config.retrieval.top_k,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/documents", post(handle_ingest).get(handle_list_documents))
        .route("/documents/{id}", get(handle_get_document))
        .route("/search", post(handle_search))
        .route("/questions", post(handle_record_question).get(handle_list_questions))
        .route("/questions/stats", get(handle_question_stats))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let state = AppState::new(config, pool)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");
    println!("ragdesk server listening on http://{}", config.server.bind);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    /// Whether searches currently take the semantic path.
    vector_index_ready: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        vector_index_ready: state.engine.index().is_ready(),
    })
}

// ============ Documents ============

#[derive(Deserialize)]
struct IngestRequest {
    title: String,
    content: String,
}

async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<Ingestion>), AppError> {
    if req.title.trim().is_empty() {
        return Err(bad_request("title must not be empty"));
    }
    let ingestion = state.engine.ingest(&req.title, &req.content).await?;
    Ok((StatusCode::CREATED, Json(ingestion)))
}

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<Document>,
}

async fn handle_list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state.engine.store().all().await?;
    Ok(Json(DocumentListResponse { documents }))
}

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Document>, AppError> {
    state
        .engine
        .store()
        .get(DocId(id))
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("document not found: {}", id)))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let top_k = req.top_k.unwrap_or(state.default_top_k);
    let results = state.engine.search(&req.query, top_k).await;
    Json(SearchResponse { results })
}

// ============ Questions ============

async fn handle_record_question(
    State(state): State<AppState>,
    Json(req): Json<NewQuestion>,
) -> Result<(StatusCode, Json<QuestionRecord>), AppError> {
    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let record = record_question(&state.pool, state.classifier.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Deserialize)]
struct QuestionsQuery {
    username: Option<String>,
}

#[derive(Serialize)]
struct QuestionListResponse {
    questions: Vec<QuestionRecord>,
}

async fn handle_list_questions(
    State(state): State<AppState>,
    Query(params): Query<QuestionsQuery>,
) -> Result<Json<QuestionListResponse>, AppError> {
    let questions = list_questions(&state.pool, params.username.as_deref()).await?;
    Ok(Json(QuestionListResponse { questions }))
}

async fn handle_question_stats(
    State(state): State<AppState>,
) -> Result<Json<QuestionStats>, AppError> {
    Ok(Json(stats_summary(&state.pool).await?))
}

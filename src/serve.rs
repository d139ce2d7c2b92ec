//! JSON HTTP server.
//!
//! Exposes the knowledge base over a small JSON API. The index lives in
//! memory for the lifetime of the process; documents posted to `/documents`
//! stay searchable until the server stops.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/stats` | Document and chunk counts plus document metadata |
//! | `POST` | `/documents` | Ingest a document (inline text or base64 PDF) |
//! | `POST` | `/search` | Ranked passages for a query |
//! | `POST` | `/ask` | Grounded answer with citations |
//! | `POST` | `/quiz` | Practice quiz from ingested material |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "empty_content", "message": "no extractable text content" } }
//! ```
//!
//! Error codes: `bad_request` (400), `empty_content` (400),
//! `extraction_failed` (400), `generation_failed` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::compose;
use crate::config::Config;
use crate::error::EngineError;
use crate::extract;
use crate::generate::{self, Generator};
use crate::index::KnowledgeBase;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    kb: Arc<KnowledgeBase>,
    generator: Arc<dyn Generator>,
}

/// Start the HTTP server on the configured bind address.
///
/// The knowledge base is constructed here and shared across handlers; it is
/// torn down when the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let generator: Arc<dyn Generator> = Arc::from(generate::create_generator(&config.generation)?);

    let state = AppState {
        config: Arc::new(config.clone()),
        kb: Arc::new(KnowledgeBase::new()),
        generator,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/documents", post(add_document))
        .route("/search", post(search))
        .route("/ask", post(ask))
        .route("/quiz", post(quiz))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("Tutor Harness listening on {}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error mapping ============

struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match &e {
            EngineError::EmptyContent => Self {
                status: StatusCode::BAD_REQUEST,
                code: "empty_content",
                message: e.to_string(),
            },
            EngineError::Extraction(_) => Self {
                status: StatusCode::BAD_REQUEST,
                code: "extraction_failed",
                message: e.to_string(),
            },
            EngineError::Generation(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                code: "generation_failed",
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": { "code": self.code, "message": self.message }
        });
        (self.status, Json(body)).into_response()
    }
}

// ============ Handlers ============

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.kb.stats())
}

#[derive(Deserialize)]
struct AddDocumentRequest {
    filename: String,
    /// Inline document text.
    text: Option<String>,
    /// Base64-encoded PDF bytes; takes precedence over `text`.
    content_base64: Option<String>,
}

async fn add_document(
    State(state): State<AppState>,
    Json(req): Json<AddDocumentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let text = match (&req.content_base64, &req.text) {
        (Some(encoded), _) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| ApiError::bad_request(format!("invalid base64 content: {}", e)))?;
            extract::extract_pdf_text(&bytes)?
        }
        (None, Some(text)) => text.clone(),
        (None, None) => {
            return Err(ApiError::bad_request(
                "either text or content_base64 is required",
            ))
        }
    };

    let (document_id, chunk_count) =
        state
            .kb
            .add_document(&text, &req.filename, &state.config.chunking)?;

    Ok(Json(serde_json::json!({
        "document_id": document_id,
        "chunk_count": chunk_count,
    })))
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    limit: Option<usize>,
}

async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Json<serde_json::Value> {
    let limit = req.limit.unwrap_or(state.config.retrieval.max_results);
    let results = state.kb.search(&req.query, limit);
    Json(serde_json::json!({ "results": results }))
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    /// Explanation complexity; anything containing `advanced` selects the
    /// technical template.
    level: Option<String>,
}

async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<crate::models::AnswerResponse>, ApiError> {
    let level = req.level.as_deref().unwrap_or("beginner");
    let response = compose::generate_answer(
        &state.kb,
        state.generator.as_ref(),
        &req.question,
        level,
    )
    .await?;
    Ok(Json(response))
}

#[derive(Deserialize)]
struct QuizRequest {
    topic: Option<String>,
    count: Option<usize>,
}

async fn quiz(
    State(state): State<AppState>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<crate::models::QuizResponse>, ApiError> {
    let response = compose::generate_quiz(
        &state.kb,
        state.generator.as_ref(),
        req.topic.as_deref(),
        req.count.unwrap_or(5),
    )
    .await?;
    Ok(Json(response))
}

//! HTTP server exposing the document-chat API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/documents` | Ingest document text for an owner |
//! | `GET`  | `/documents/{owner_id}` | List an owner's documents |
//! | `DELETE` | `/documents/{owner_id}/{file_name}` | Delete a document |
//! | `POST` | `/chats` | Create a chat bound to a document file name |
//! | `GET`  | `/chats/{chat_id}` | Fetch a chat with its turns |
//! | `DELETE` | `/chats/{chat_id}` | Delete a chat |
//! | `GET`  | `/users/{owner_id}/chats` | List an owner's chats |
//! | `POST` | `/chats/{chat_id}/ask` | Ask a question against the chat's document |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one JSON shape:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "chat 'abc' does not exist" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `no_relevant_content` (404), `embedding_failed` / `generation_failed`
//! (502), `embeddings_disabled` / `generation_disabled` (400),
//! `integrity_error` / `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the browser frontend is
//! served from a different origin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::error::Error;
use crate::generation::create_generator;
use crate::ingest::run_ingest;
use crate::models::ChatSession;
use crate::query::run_ask;
use crate::store::Store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn Store>,
}

/// Start the HTTP server on `[server].bind` with the given store.
/// Runs until the process is terminated.
pub async fn run_server(config: Arc<Config>, store: Arc<dyn Store>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState { config, store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/documents", post(handle_ingest))
        .route("/documents/{owner_id}", get(handle_list_documents))
        .route(
            "/documents/{owner_id}/{file_name}",
            delete(handle_delete_document),
        )
        .route("/chats", post(handle_create_chat))
        .route("/chats/{chat_id}", get(handle_get_chat).delete(handle_delete_chat))
        .route("/chats/{chat_id}/ask", post(handle_ask))
        .route("/users/{owner_id}/chats", get(handle_list_chats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(addr = %bind_addr, "server listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": { "code": self.code, "message": self.message }
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Input(_) => AppError::bad_request(err.to_string()),
            Error::NotFound(_) => AppError::not_found(err.to_string()),
            Error::NoRelevantContent => AppError::new(
                StatusCode::NOT_FOUND,
                "no_relevant_content",
                err.to_string(),
            ),
            Error::Embedding(_) => {
                AppError::new(StatusCode::BAD_GATEWAY, "embedding_failed", err.to_string())
            }
            Error::Generation(_) => AppError::new(
                StatusCode::BAD_GATEWAY,
                "generation_failed",
                err.to_string(),
            ),
            Error::Integrity(_) => AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "integrity_error",
                err.to_string(),
            ),
            Error::Storage(_) => {
                tracing::error!(error = %err, "storage failure");
                AppError::internal("storage failure")
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "internal failure");
        AppError::internal("internal failure")
    }
}

// ============ GET /health ============

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============ POST /documents ============

#[derive(Deserialize)]
struct IngestRequest {
    owner_id: String,
    file_name: String,
    text: String,
}

async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let embedder = create_embedder(&state.config.embedding).map_err(|e| {
        AppError::new(StatusCode::BAD_REQUEST, "embeddings_disabled", e.to_string())
    })?;

    let report = run_ingest(
        state.store.as_ref(),
        embedder,
        &state.config,
        &req.owner_id,
        &req.file_name,
        &req.text,
    )
    .await?;

    Ok(Json(json!({ "report": report })))
}

// ============ GET /documents/{owner_id} ============

async fn handle_list_documents(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let documents = state.store.list_documents(&owner_id).await?;
    Ok(Json(json!({ "documents": documents })))
}

// ============ DELETE /documents/{owner_id}/{file_name} ============

async fn handle_delete_document(
    State(state): State<AppState>,
    Path((owner_id, file_name)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.store.delete_document(&owner_id, &file_name).await?;
    if !deleted {
        return Err(AppError::not_found(format!(
            "document '{}' does not exist",
            file_name
        )));
    }
    Ok(Json(json!({ "deleted": file_name })))
}

// ============ POST /chats ============

#[derive(Deserialize)]
struct CreateChatRequest {
    /// Client-supplied chat id; generated when omitted.
    chat_id: Option<String>,
    owner_id: String,
    file_name: String,
}

async fn handle_create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    if req.owner_id.trim().is_empty() {
        return Err(AppError::bad_request("owner_id is required"));
    }
    if req.file_name.trim().is_empty() {
        return Err(AppError::bad_request("file_name is required"));
    }

    let chat = ChatSession {
        chat_id: req
            .chat_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        owner_id: req.owner_id,
        file_name: req.file_name,
        turns: Vec::new(),
        created_at: chrono::Utc::now().timestamp(),
    };

    // Duplicate id is the client's fault; anything else the store reports
    // is ours. The store still enforces uniqueness under concurrent creates.
    if state.store.get_chat(&chat.chat_id).await?.is_some() {
        return Err(AppError::bad_request(format!(
            "chat '{}' already exists",
            chat.chat_id
        )));
    }
    state.store.create_chat(&chat).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "chat_id": chat.chat_id, "file_name": chat.file_name })),
    ))
}

// ============ GET /chats/{chat_id} ============

async fn handle_get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    let chat = state
        .store
        .get_chat(&chat_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("chat '{}' does not exist", chat_id)))?;
    Ok(Json(chat))
}

// ============ DELETE /chats/{chat_id} ============

async fn handle_delete_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.store.delete_chat(&chat_id).await?;
    if !deleted {
        return Err(AppError::not_found(format!(
            "chat '{}' does not exist",
            chat_id
        )));
    }
    Ok(Json(json!({ "deleted": chat_id })))
}

// ============ GET /users/{owner_id}/chats ============

async fn handle_list_chats(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let chats = state.store.list_chats(&owner_id).await?;
    Ok(Json(json!({ "chats": chats })))
}

// ============ POST /chats/{chat_id}/ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let embedder = create_embedder(&state.config.embedding).map_err(|e| {
        AppError::new(StatusCode::BAD_REQUEST, "embeddings_disabled", e.to_string())
    })?;
    let generator = create_generator(&state.config.generation).map_err(|e| {
        AppError::new(StatusCode::BAD_REQUEST, "generation_disabled", e.to_string())
    })?;

    let answer = run_ask(
        state.store.as_ref(),
        embedder,
        generator,
        state.config.retrieval.threshold,
        &chat_id,
        &req.question,
    )
    .await?;

    Ok(Json(json!({
        "question": answer.question,
        "answer": answer.answer,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbConfig, ServerConfig};
    use crate::models::{Document, DocumentSummary, Segment, Turn};
    use crate::store::memory::InMemoryStore;
    use anyhow::bail;

    fn test_state(store: Arc<dyn Store>) -> AppState {
        AppState {
            config: Arc::new(Config {
                db: DbConfig {
                    path: "unused.sqlite".into(),
                    max_connections: 5,
                },
                chunking: Default::default(),
                retrieval: Default::default(),
                embedding: Default::default(),
                generation: Default::default(),
                server: ServerConfig {
                    bind: "127.0.0.1:0".to_string(),
                },
            }),
            store,
        }
    }

    fn create_request(id: &str) -> Json<CreateChatRequest> {
        Json(CreateChatRequest {
            chat_id: Some(id.to_string()),
            owner_id: "alice".to_string(),
            file_name: "notes.txt".to_string(),
        })
    }

    /// Store whose every operation fails, standing in for a broken backend.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl Store for BrokenStore {
        async fn replace_segments(
            &self,
            _: &str,
            _: &str,
            _: &[Segment],
        ) -> anyhow::Result<()> {
            bail!("disk error")
        }
        async fn get_document(&self, _: &str, _: &str) -> anyhow::Result<Option<Document>> {
            bail!("disk error")
        }
        async fn list_documents(&self, _: &str) -> anyhow::Result<Vec<DocumentSummary>> {
            bail!("disk error")
        }
        async fn delete_document(&self, _: &str, _: &str) -> anyhow::Result<bool> {
            bail!("disk error")
        }
        async fn create_chat(&self, _: &ChatSession) -> anyhow::Result<()> {
            bail!("disk error")
        }
        async fn get_chat(&self, _: &str) -> anyhow::Result<Option<ChatSession>> {
            Ok(None)
        }
        async fn list_chats(&self, _: &str) -> anyhow::Result<Vec<ChatSession>> {
            bail!("disk error")
        }
        async fn delete_chat(&self, _: &str) -> anyhow::Result<bool> {
            bail!("disk error")
        }
        async fn append_turn(&self, _: &str, _: &Turn) -> anyhow::Result<()> {
            bail!("disk error")
        }
    }

    #[tokio::test]
    async fn duplicate_chat_create_is_client_error() {
        let state = test_state(Arc::new(InMemoryStore::new()));

        let first = handle_create_chat(State(state.clone()), create_request("c1")).await;
        assert!(first.is_ok());

        let Err(err) = handle_create_chat(State(state), create_request("c1")).await else {
            panic!("duplicate chat id must be rejected");
        };
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn storage_failure_on_chat_create_is_server_error() {
        let state = test_state(Arc::new(BrokenStore));

        let Err(err) = handle_create_chat(State(state), create_request("c1")).await else {
            panic!("broken store must surface an error");
        };
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "internal");
    }
}

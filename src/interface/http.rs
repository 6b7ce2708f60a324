//! HTTP JSON API using Axum.
//!
//! - `POST /chat`   `{ "question": "..." }` -> `{ "response": "...", "needs_teaching": bool }`
//! - `POST /teach`  `{ "question": "...", "answer": "..." }`
//! - `GET  /health`

use crate::core::knowledge::{ChatReply, Embedder, KnowledgeError, KnowledgeService, KnowledgeStore};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

const TEACH_THANKS_REPLY: &str = "Got it. Thanks for teaching me!";

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Deserialize)]
struct TeachRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

/// Per-request failure, rendered as `{ "error": "..." }`.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Knowledge(KnowledgeError),
}

impl From<KnowledgeError> for ApiError {
    fn from(err: KnowledgeError) -> Self {
        ApiError::Knowledge(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Knowledge(err) => {
                let status = match &err {
                    KnowledgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    KnowledgeError::EmbeddingUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    KnowledgeError::CorruptStore(_)
                    | KnowledgeError::StorageWriteFailure(_)
                    | KnowledgeError::StorageReadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                (status, err.to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Bodies are parsed regardless of Content-Type, like a forgiving form handler.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

async fn chat<E, S>(
    State(service): State<Arc<KnowledgeService<E, S>>>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError>
where
    E: Embedder + 'static,
    S: KnowledgeStore + 'static,
{
    let request: ChatRequest = parse_body(&body)?;
    let reply = service.ask(&request.question).await?;
    Ok(Json(reply))
}

async fn teach<E, S>(
    State(service): State<Arc<KnowledgeService<E, S>>>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError>
where
    E: Embedder + 'static,
    S: KnowledgeStore + 'static,
{
    let request: TeachRequest = parse_body(&body)?;
    service.teach(&request.question, &request.answer).await?;
    Ok(Json(ChatReply::answer(TEACH_THANKS_REPLY)))
}

async fn health<E, S>(State(service): State<Arc<KnowledgeService<E, S>>>) -> Json<serde_json::Value>
where
    E: Embedder + 'static,
    S: KnowledgeStore + 'static,
{
    Json(serde_json::json!({
        "status": "ok",
        "questions": service.len().await,
    }))
}

pub fn router<E, S>(service: Arc<KnowledgeService<E, S>>) -> Router
where
    E: Embedder + 'static,
    S: KnowledgeStore + 'static,
{
    Router::new()
        .route("/chat", post(chat::<E, S>))
        .route("/teach", post(teach::<E, S>))
        .route("/health", get(health::<E, S>))
        .with_state(service)
}

/// Serve the API until Ctrl-C.
pub async fn serve<E, S>(service: Arc<KnowledgeService<E, S>>, addr: SocketAddr) -> anyhow::Result<()>
where
    E: Embedder + 'static,
    S: KnowledgeStore + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP API listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down HTTP API");
        })
        .await?;
    Ok(())
}

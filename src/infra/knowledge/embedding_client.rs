// =============================================================================
// EMBEDDING CLIENT - OpenAI-compatible /embeddings API
// =============================================================================
//
// Implements the `Embedder` port against any provider speaking the OpenAI
// embeddings format:
//
//   POST {base_url}/embeddings
//   { "model": "all-minilm", "input": ["text", ...] }
//   -> { "data": [ { "index": 0, "embedding": [0.1, ...] }, ... ] }
//
// That covers OpenAI itself, Ollama (`/v1`), LM Studio and
// text-embeddings-inference. The default points at a local Ollama serving
// all-MiniLM-L6-v2.
//
// **Retries:** connection errors, timeouts, HTTP 5xx and 429 are retried
// exactly once. Any other failure is returned immediately.

use crate::core::knowledge::{Embedder, Embedding, EmbeddingError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Why a single request failed, and whether it's worth another try.
#[derive(Debug)]
enum AttemptError {
    Transient(String),
    Permanent(String),
}

impl AttemptError {
    fn into_message(self) -> String {
        match self {
            AttemptError::Transient(msg) | AttemptError::Permanent(msg) => msg,
        }
    }
}

pub struct OpenAiEmbeddingClient {
    client: Client,
    endpoint: String,
    config: EmbeddingConfig,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Unavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: Self::endpoint_for(&config.base_url),
            config,
        })
    }

    fn endpoint_for(base_url: &str) -> String {
        format!("{}/embeddings", base_url.trim_end_matches('/'))
    }

    fn is_transient_status(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    /// Restore input order using `index` when the provider sends it, and
    /// check the batch is 1:1 with the request.
    fn into_ordered(
        mut data: Vec<EmbeddingData>,
        expected: usize,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        if data.len() != expected {
            return Err(EmbeddingError::Unavailable(format!(
                "malformed response: expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }

        let indexed = data.iter().filter(|d| d.index.is_some()).count();
        if indexed != 0 && indexed != data.len() {
            return Err(EmbeddingError::Unavailable(
                "malformed response: only some embeddings carry an index".to_string(),
            ));
        }

        if indexed == data.len() {
            data.sort_by_key(|d| d.index);
            let in_range = data
                .iter()
                .enumerate()
                .all(|(pos, d)| d.index == Some(pos));
            if !in_range {
                return Err(EmbeddingError::Unavailable(
                    "malformed response: embedding indices are not 0..n".to_string(),
                ));
            }
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    async fn request_once(&self, texts: &[String]) -> Result<Vec<Embedding>, AttemptError> {
        let payload = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AttemptError::Transient(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("embedding API error: {} - {}", status, text);
            return Err(if Self::is_transient_status(status) {
                AttemptError::Transient(message)
            } else {
                AttemptError::Permanent(message)
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Permanent(format!("malformed response: {}", e)))?;

        Self::into_ordered(body.data, texts.len())
            .map_err(|EmbeddingError::Unavailable(msg)| AttemptError::Permanent(msg))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbeddingClient {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match self.request_once(texts).await {
            Ok(embeddings) => Ok(embeddings),
            Err(AttemptError::Transient(first)) => {
                tracing::warn!(error = %first, "Embedding request failed, retrying once");
                tokio::time::sleep(RETRY_DELAY).await;
                self.request_once(texts)
                    .await
                    .map_err(|e| EmbeddingError::Unavailable(e.into_message()))
            }
            Err(e) => Err(EmbeddingError::Unavailable(e.into_message())),
        }
    }
}

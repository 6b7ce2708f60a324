use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// A fixed-length vector representation of a piece of text.
pub type Embedding = Vec<f32>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider could not be reached, refused the request or returned
    /// something we can't use. Fatal at startup.
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// EMBEDDER TRAIT (PORT)
// ============================================================================
// The core only needs "text in, vector out". Which model produces the vectors
// (a local Ollama, OpenAI, a fake in tests) is decided by the infra layer.

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. The output is 1:1 with `texts` and in the same order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut batch = self.embed_many(&[text.to_string()]).await?;
        match batch.pop() {
            Some(embedding) if batch.is_empty() => Ok(embedding),
            _ => Err(EmbeddingError::Unavailable(
                "provider returned the wrong number of embeddings".to_string(),
            )),
        }
    }
}

// Blanket implementations so the service can hold either a trait object
// picked at startup or a shared handle.
#[async_trait]
impl Embedder for Box<dyn Embedder> {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        (**self).embed_many(texts).await
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        (**self).embed_many(texts).await
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        (**self).embed(text).await
    }
}

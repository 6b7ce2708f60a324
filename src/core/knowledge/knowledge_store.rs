use super::knowledge_models::KnowledgeBase;
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Stored content exists but isn't a valid knowledge base.
    /// Never "fixed" by overwriting - that would destroy user data.
    #[error("Knowledge base at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The previous snapshot on disk is still intact when this is returned.
    #[error("Failed to write knowledge base to {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },

    #[error("Failed to read knowledge base from {path}: {reason}")]
    ReadFailure { path: PathBuf, reason: String },
}

/// Trait for loading and saving the whole knowledge base.
///
/// There is no incremental write: `persist` always replaces the stored copy
/// with the full base it is given.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Load the stored base. A missing or empty store is initialized with
    /// an empty base (and written) before returning it.
    async fn load(&self) -> Result<KnowledgeBase, StoreError>;

    /// Replace the stored base with `base`, atomically.
    async fn persist(&self, base: &KnowledgeBase) -> Result<(), StoreError>;

    /// Human-readable description of where the data lives, for logs.
    fn location(&self) -> String;
}

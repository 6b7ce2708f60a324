pub mod embedder;
pub mod knowledge_models;
pub mod knowledge_service;
pub mod knowledge_store;
pub mod matcher;

#[cfg(test)]
pub(crate) mod fakes;

pub use embedder::{Embedder, Embedding, EmbeddingError};
pub use knowledge_models::{ChatReply, KnowledgeBase};
pub use knowledge_service::{is_quit, KnowledgeError, KnowledgeService};
pub use knowledge_store::{KnowledgeStore, StoreError};
pub use matcher::{Matcher, DEFAULT_MATCH_THRESHOLD};

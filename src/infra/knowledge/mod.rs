pub mod embedding_client;
pub mod json_store;

pub use embedding_client::{EmbeddingConfig, OpenAiEmbeddingClient};
pub use json_store::JsonKnowledgeStore;

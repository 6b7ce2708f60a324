// Runtime configuration, read from environment variables (a `.env` file is
// loaded first by main, if present).
//
// KNOWLEDGE_BASE_PATH     knowledge base JSON file   (knowledge_base.json)
// EMBEDDING_API_URL       OpenAI-compatible base URL (http://localhost:11434/v1)
// EMBEDDING_MODEL         embedding model name       (all-minilm)
// EMBEDDING_API_KEY       bearer token, optional
// EMBEDDING_TIMEOUT_SECS  per-request timeout        (30)
// MATCH_THRESHOLD         similarity cutoff          (0.7)

use crate::core::knowledge::DEFAULT_MATCH_THRESHOLD;
use crate::infra::knowledge::EmbeddingConfig;
use anyhow::{bail, Context};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "knowledge_base.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub knowledge_base_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub match_threshold: f32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset and blank values fall
    /// back to defaults; values that are set but invalid are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = EmbeddingConfig::default();

        let timeout = match get("EMBEDDING_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("EMBEDDING_TIMEOUT_SECS must be a whole number, got {raw:?}"))?;
                if secs == 0 {
                    bail!("EMBEDDING_TIMEOUT_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        let match_threshold = match get("MATCH_THRESHOLD") {
            Some(raw) => {
                let value: f32 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("MATCH_THRESHOLD must be a number, got {raw:?}"))?;
                if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                    bail!("MATCH_THRESHOLD must be between -1 and 1, got {value}");
                }
                value
            }
            None => DEFAULT_MATCH_THRESHOLD,
        };

        Ok(Self {
            knowledge_base_path: get("KNOWLEDGE_BASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KNOWLEDGE_BASE_PATH)),
            embedding: EmbeddingConfig {
                base_url: get("EMBEDDING_API_URL").unwrap_or(defaults.base_url),
                model: get("EMBEDDING_MODEL").unwrap_or(defaults.model),
                api_key: get("EMBEDDING_API_KEY"),
                timeout,
            },
            match_threshold,
        })
    }
}

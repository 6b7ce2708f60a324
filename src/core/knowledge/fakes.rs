// Test doubles for the knowledge ports. Only compiled for tests.

use super::embedder::{Embedder, Embedding, EmbeddingError};
use super::knowledge_models::KnowledgeBase;
use super::knowledge_store::{KnowledgeStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Returns fixed vectors for known texts and fails for anything else.
#[derive(Clone, Default)]
pub struct ScriptedEmbedder {
    vectors: Arc<HashMap<String, Embedding>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: &str, vector: Embedding) -> Self {
        Arc::make_mut(&mut self.vectors).insert(text.to_string(), vector);
        self
    }

    /// Number of `embed_many` calls made so far (single embeds count too).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .ok_or_else(|| EmbeddingError::Unavailable(format!("no vector for {t:?}")))
            })
            .collect()
    }
}

/// Deterministic embedder: a histogram of the text's bytes.
/// Identical text always yields an identical vector.
#[derive(Clone, Default)]
pub struct ByteHistogramEmbedder;

impl ByteHistogramEmbedder {
    const DIMS: usize = 32;

    pub fn new() -> Self {
        Self
    }

    fn histogram(text: &str) -> Embedding {
        let mut v = vec![0.0; Self::DIMS];
        for b in text.bytes() {
            v[b as usize % Self::DIMS] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for ByteHistogramEmbedder {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::histogram(t)).collect())
    }
}

/// Byte histogram embedder that parks any batch containing `gate` until
/// `release` is notified. `entered` fires once a parked batch is waiting.
#[derive(Clone)]
pub struct GatedEmbedder {
    gate: String,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedEmbedder {
    pub fn new(gate: &str) -> Self {
        Self {
            gate: gate.to_string(),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Embedder for GatedEmbedder {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.iter().any(|t| *t == self.gate) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(texts.iter().map(|t| ByteHistogramEmbedder::histogram(t)).collect())
    }
}

/// Always unavailable.
pub struct OfflineEmbedder;

#[async_trait]
impl Embedder for OfflineEmbedder {
    async fn embed_many(&self, _: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("connection refused".to_string()))
    }
}

/// In-memory store that records every persisted snapshot and can be told to
/// fail writes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    initial: KnowledgeBase,
    snapshots: Arc<Mutex<Vec<KnowledgeBase>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(initial: KnowledgeBase) -> Self {
        Self {
            initial,
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn last_snapshot(&self) -> Option<KnowledgeBase> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn load(&self) -> Result<KnowledgeBase, StoreError> {
        Ok(self.initial.clone())
    }

    async fn persist(&self, base: &KnowledgeBase) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailure {
                path: PathBuf::from("memory"),
                reason: "disk full".to_string(),
            });
        }
        self.snapshots.lock().unwrap().push(base.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// The knowledge service is the session orchestrator: it ties the matcher and
// the store together and owns the single in-memory knowledge base.
// Front ends (terminal, HTTP) only talk to this type.

use super::embedder::{Embedder, EmbeddingError};
use super::knowledge_models::{ChatReply, InvalidInput, KnowledgeBase, MatchResult};
use super::knowledge_store::{KnowledgeStore, StoreError};
use super::matcher::Matcher;
use thiserror::Error;
use tokio::sync::RwLock;

pub const QUIT_SENTINEL: &str = "quit";
pub const GOODBYE_REPLY: &str = "Goodbye!";
pub const TEACH_ME_REPLY: &str = "I don't understand. Can you teach me?";
pub const NO_ANSWER_REPLY: &str = "No answer found.";

pub(crate) const PROBE_TEXT: &str = "embedding provider health check";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("{0}")]
    CorruptStore(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("{0}")]
    StorageWriteFailure(String),

    #[error("{0}")]
    StorageReadFailure(String),
}

impl From<EmbeddingError> for KnowledgeError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Unavailable(reason) => KnowledgeError::EmbeddingUnavailable(reason),
        }
    }
}

impl From<StoreError> for KnowledgeError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::Corrupt { .. } => KnowledgeError::CorruptStore(message),
            StoreError::WriteFailure { .. } => KnowledgeError::StorageWriteFailure(message),
            StoreError::ReadFailure { .. } => KnowledgeError::StorageReadFailure(message),
        }
    }
}

/// Returns true for the sentinel that ends an interactive session.
/// Callers strip line endings; surrounding spaces are not ignored here.
pub fn is_quit(text: &str) -> bool {
    text.eq_ignore_ascii_case(QUIT_SENTINEL)
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Owns the knowledge base for the lifetime of the process.
///
/// **Locking:**
/// - `ask` copies a snapshot under the read lock and does all embedding
///   work after releasing it.
/// - `teach` holds the write lock across append + persist, so two teach
///   calls can never interleave or lose each other's pair.
pub struct KnowledgeService<E: Embedder, S: KnowledgeStore> {
    matcher: Matcher<E>,
    store: S,
    base: RwLock<KnowledgeBase>,
}

impl<E: Embedder, S: KnowledgeStore> KnowledgeService<E, S> {
    /// Load the store and check the embedder is reachable.
    ///
    /// Both a corrupt store and an unreachable embedder are fatal: the
    /// service refuses to start rather than run half-working.
    pub async fn start(matcher: Matcher<E>, store: S) -> Result<Self, KnowledgeError> {
        let base = store.load().await?;

        let blank = base.blank_question_count();
        if blank > 0 {
            tracing::warn!(
                blank,
                location = %store.location(),
                "Knowledge base contains pairs with an empty question"
            );
        }

        matcher.embedder().embed(PROBE_TEXT).await?;

        if base.is_empty() {
            tracing::info!("Knowledge base is empty; unanswered questions will ask to be taught");
        }

        tracing::info!(
            pairs = base.len(),
            location = %store.location(),
            threshold = matcher.threshold(),
            "Knowledge base loaded"
        );

        Ok(Self {
            matcher,
            store,
            base: RwLock::new(base),
        })
    }

    /// Answer a query, or ask to be taught.
    pub async fn ask(&self, query: &str) -> Result<ChatReply, KnowledgeError> {
        if is_quit(query) {
            return Ok(ChatReply::answer(GOODBYE_REPLY));
        }
        if query.trim().is_empty() {
            return Err(InvalidInput::EmptyQuery.into());
        }

        // Snapshot first; the lock is released before any embedding happens.
        let snapshot = self.snapshot().await;
        let candidates = snapshot.questions();

        match self.matcher.find_best_match(query, &candidates).await? {
            MatchResult::Matched { question, score } => match snapshot.answer_for(&question) {
                Some(answer) => {
                    tracing::info!(score, matched = %question, "Answered from knowledge base");
                    Ok(ChatReply::answer(answer))
                }
                None => {
                    tracing::warn!(matched = %question, "Matched question has no stored answer");
                    Ok(ChatReply::answer(NO_ANSWER_REPLY))
                }
            },
            MatchResult::NoMatch => Ok(ChatReply::teach_me(TEACH_ME_REPLY)),
        }
    }

    /// Teach a new pair. The pair is visible to later queries only once it
    /// has been written to the store.
    pub async fn teach(&self, question: &str, answer: &str) -> Result<(), KnowledgeError> {
        let mut base = self.base.write().await;

        let mut next = base.clone();
        next.append(question, answer)?;

        if let Err(e) = self.store.persist(&next).await {
            tracing::error!(error = %e, "Teach failed; keeping previous knowledge base");
            return Err(e.into());
        }

        *base = next;
        tracing::info!(pairs = base.len(), question, "Learned new answer");
        Ok(())
    }

    /// A copy of the current knowledge base.
    pub async fn snapshot(&self) -> KnowledgeBase {
        self.base.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.base.read().await.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

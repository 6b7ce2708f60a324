// Nearest-question matching by cosine similarity.
//
// Every call embeds the query and the full candidate list from scratch.
// Nothing is cached, so there is nothing to invalidate when a pair is taught.

use super::embedder::{Embedder, EmbeddingError};
use super::knowledge_models::MatchResult;

/// Similarity a candidate must strictly exceed to count as a match.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.7;

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Returns 0.0 for empty vectors, vectors of different lengths, or a
/// zero-magnitude vector, so a degenerate embedding can never win a match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Pick the highest score and keep it only if it is strictly above `threshold`.
///
/// Ties go to the lowest index. NaN scores are skipped.
pub fn select_best(scores: &[f32], threshold: f32) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }

    best.filter(|&(_, score)| score > threshold)
}

pub struct Matcher<E: Embedder> {
    embedder: E,
    threshold: f32,
}

impl<E: Embedder> Matcher<E> {
    #[cfg(test)]
    pub fn new(embedder: E) -> Self {
        Self::with_threshold(embedder, DEFAULT_MATCH_THRESHOLD)
    }

    pub fn with_threshold(embedder: E, threshold: f32) -> Self {
        Self {
            embedder,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Find the stored question closest to `query`.
    ///
    /// An empty candidate list returns `NoMatch` without calling the embedder.
    pub async fn find_best_match(
        &self,
        query: &str,
        candidates: &[String],
    ) -> Result<MatchResult, EmbeddingError> {
        if candidates.is_empty() {
            return Ok(MatchResult::NoMatch);
        }

        let query_vec = self.embedder.embed(query).await?;
        let candidate_vecs = self.embedder.embed_many(candidates).await?;

        if candidate_vecs.len() != candidates.len() {
            return Err(EmbeddingError::Unavailable(format!(
                "expected {} embeddings, provider returned {}",
                candidates.len(),
                candidate_vecs.len()
            )));
        }

        let scores: Vec<f32> = candidate_vecs
            .iter()
            .map(|v| cosine_similarity(&query_vec, v))
            .collect();

        match select_best(&scores, self.threshold) {
            Some((idx, score)) => {
                tracing::debug!(idx, score, candidate = %candidates[idx], "Matched stored question");
                Ok(MatchResult::Matched {
                    question: candidates[idx].clone(),
                    score,
                })
            }
            None => {
                tracing::debug!(
                    best = scores.iter().copied().fold(f32::NAN, f32::max),
                    threshold = self.threshold,
                    "No stored question above threshold"
                );
                Ok(MatchResult::NoMatch)
            }
        }
    }
}

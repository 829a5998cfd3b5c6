// src/matching/embedding.rs
// Semantic fallback: embed the best candidate variant (plus its
// transliteration when the script is non-Latin) and compare against every
// user's precomputed embedding under a cooperative time budget.

use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use crate::config::MatcherConfig;
use crate::matching::transliteration::{get_transliteration, has_non_latin_chars};
use crate::models::{CandidateVariant, MatchCandidate, MatchMethod, Roster};
use crate::utils::{cosine_similarity_candle, l2_normalize};
use crate::EmbeddingPipeline;

/// Result of an embedding pass. `inference_failed` lets the orchestrator
/// count backend failures without the failure ever reaching the caller.
#[derive(Debug, Default)]
pub struct EmbeddingOutcome {
    pub matches: Vec<MatchCandidate>,
    pub inference_failed: bool,
}

pub struct EmbeddingMatcher<'a> {
    config: &'a MatcherConfig,
    embedder: &'a dyn EmbeddingPipeline,
}

impl<'a> EmbeddingMatcher<'a> {
    pub fn new(config: &'a MatcherConfig, embedder: &'a dyn EmbeddingPipeline) -> Self {
        Self { config, embedder }
    }

    /// Compare the first variant against the roster by cosine similarity.
    /// The budget bounds how many roster comparisons are attempted, not the
    /// latency of the embedding call itself; once exceeded, whatever was
    /// accumulated so far is returned.
    pub fn embedding_match(
        &self,
        variants: &[CandidateVariant],
        roster: &Roster,
        threshold: f64,
        timeout_ms: u64,
    ) -> EmbeddingOutcome {
        let best = match variants.first() {
            Some(v) => v,
            None => return EmbeddingOutcome::default(),
        };

        let start = Instant::now();

        let transliterated = if has_non_latin_chars(&best.text) {
            get_transliteration(&best.text)
        } else {
            None
        };

        let mut texts_to_embed: Vec<&str> = vec![best.text.as_str()];
        if let Some(t) = transliterated {
            if t != best.text {
                texts_to_embed.push(t);
            }
        }

        if start.elapsed().as_millis() as u64 > timeout_ms {
            return EmbeddingOutcome::default();
        }

        let mut candidate_embedding = match self.embedder.embed_batch(&texts_to_embed) {
            Ok(mut embeddings) if !embeddings.is_empty() => embeddings.remove(0),
            Ok(_) => {
                warn!("Embedding backend returned no vectors");
                return EmbeddingOutcome {
                    matches: Vec::new(),
                    inference_failed: true,
                };
            }
            Err(e) => {
                warn!("Error in embedding matching: {}", e);
                return EmbeddingOutcome {
                    matches: Vec::new(),
                    inference_failed: true,
                };
            }
        };
        l2_normalize(&mut candidate_embedding);

        let mut matches = Vec::new();
        for user in &roster.records {
            if user.embedding.is_empty() {
                continue;
            }

            if start.elapsed().as_millis() as u64 > timeout_ms {
                debug!(
                    "Embedding budget of {}ms exceeded; returning {} partial matches",
                    timeout_ms,
                    matches.len()
                );
                break;
            }

            let cosine_sim = match cosine_similarity_candle(&candidate_embedding, &user.embedding)
            {
                Ok(sim) => sim,
                Err(e) => {
                    warn!(
                        "Failed cosine similarity for user {}: {}",
                        user.id, e
                    );
                    continue;
                }
            };

            if cosine_sim >= threshold {
                matches.push(MatchCandidate {
                    user_id: user.id.clone(),
                    user_name: user.display_name.clone(),
                    variant: best.text.clone(),
                    source_candidate_text: best.source_candidate_text.clone(),
                    score: (cosine_sim * 100.0).clamp(0.0, 100.0),
                    method: MatchMethod::Embedding,
                    flags: HashSet::new(),
                });
            }
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        EmbeddingOutcome {
            matches,
            inference_failed: false,
        }
    }

    /// Budget accessors from configuration, for callers that pass defaults.
    pub fn default_threshold(&self) -> f64 {
        self.config.emb_accept
    }

    pub fn default_timeout_ms(&self) -> u64 {
        self.config.embedding_timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    impl EmbeddingPipeline for FixedEmbedder {
        fn embed_text(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(self.vector.clone())
        }

        fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }
    }

    struct FailingEmbedder;

    impl EmbeddingPipeline for FailingEmbedder {
        fn embed_text(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            anyhow::bail!("model backend unavailable")
        }

        fn embed_batch(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("model backend unavailable")
        }
    }

    struct SlowEmbedder {
        vector: Vec<f32>,
        delay_ms: u64,
    }

    impl EmbeddingPipeline for SlowEmbedder {
        fn embed_text(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
            Ok(self.vector.clone())
        }

        fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }
    }

    fn user_with_embedding(id: &str, name: &str, embedding: Vec<f32>) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            display_name: name.to_string(),
            normalized_name: name.to_lowercase(),
            tokens: name
                .to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            initials: String::new(),
            embedding,
        }
    }

    fn roster(records: Vec<UserRecord>) -> Roster {
        let dim = records.first().map(|r| r.embedding.len()).unwrap_or(0);
        Roster {
            records,
            embedding_dim: dim,
            token_dictionary: HashSet::new(),
        }
    }

    fn variant(text: &str) -> CandidateVariant {
        CandidateVariant {
            text: text.to_string(),
            source_candidate_text: text.to_string(),
        }
    }

    #[test]
    fn matching_vector_scores_full_similarity() {
        let config = MatcherConfig::default();
        let embedder = FixedEmbedder {
            vector: vec![1.0, 0.0, 0.0],
        };
        let matcher = EmbeddingMatcher::new(&config, &embedder);
        let roster = roster(vec![
            user_with_embedding("u1", "Emma Brown", vec![1.0, 0.0, 0.0]),
            user_with_embedding("u2", "John Smith", vec![0.0, 1.0, 0.0]),
        ]);

        let outcome =
            matcher.embedding_match(&[variant("emma brown")], &roster, 0.75, 1000);
        assert!(!outcome.inference_failed);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].user_id, "u1");
        assert!((outcome.matches[0].score - 100.0).abs() < 1e-6);
        assert_eq!(outcome.matches[0].method, MatchMethod::Embedding);
    }

    #[test]
    fn below_threshold_pairs_dropped() {
        let config = MatcherConfig::default();
        let embedder = FixedEmbedder {
            vector: vec![1.0, 0.0],
        };
        let matcher = EmbeddingMatcher::new(&config, &embedder);
        let roster = roster(vec![user_with_embedding("u1", "John Smith", vec![0.0, 1.0])]);

        let outcome = matcher.embedding_match(&[variant("emma")], &roster, 0.75, 1000);
        assert!(outcome.matches.is_empty());
        assert!(!outcome.inference_failed);
    }

    #[test]
    fn backend_failure_recovered_as_empty() {
        let config = MatcherConfig::default();
        let embedder = FailingEmbedder;
        let matcher = EmbeddingMatcher::new(&config, &embedder);
        let roster = roster(vec![user_with_embedding("u1", "Emma Brown", vec![1.0, 0.0])]);

        let outcome = matcher.embedding_match(&[variant("emma brown")], &roster, 0.75, 1000);
        assert!(outcome.matches.is_empty());
        assert!(outcome.inference_failed);
    }

    #[test]
    fn exceeded_budget_returns_partial_results() {
        let config = MatcherConfig::default();
        let embedder = SlowEmbedder {
            vector: vec![1.0, 0.0],
            delay_ms: 20,
        };
        let matcher = EmbeddingMatcher::new(&config, &embedder);
        let roster = roster(vec![
            user_with_embedding("u1", "Emma Brown", vec![1.0, 0.0]),
            user_with_embedding("u2", "Emma Browne", vec![1.0, 0.0]),
        ]);

        // The embed call alone blows the budget; the comparison loop must
        // stop before scoring any user.
        let outcome = matcher.embedding_match(&[variant("emma brown")], &roster, 0.75, 5);
        assert!(outcome.matches.is_empty());
        assert!(!outcome.inference_failed);
    }

    #[test]
    fn empty_variants_yield_empty_outcome() {
        let config = MatcherConfig::default();
        let embedder = FixedEmbedder { vector: vec![1.0] };
        let matcher = EmbeddingMatcher::new(&config, &embedder);
        let roster = roster(vec![]);

        let outcome = matcher.embedding_match(&[], &roster, 0.75, 1000);
        assert!(outcome.matches.is_empty());
        assert!(!outcome.inference_failed);
    }
}

// src/config.rs
// Centralized thresholds, bonuses and limits for the matching pipeline.

/// Immutable per-request configuration. Read once at pipeline start.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum fuzzy score (0-100) for a pair to be accepted.
    pub fuzzy_accept: f64,
    /// Minimum cosine similarity (0-1) for an embedding pair to be accepted.
    pub emb_accept: f64,

    /// Added to matches whose source candidate carries the primary anchor.
    pub anchor_bonus: f64,
    /// Applied (negative) to candidates appearing in a CC region.
    pub cc_penalty: f64,
    /// Applied (negative) once per description containing an error marker.
    pub err_penalty: f64,
    /// Added when the candidate's first token equals the user's first token.
    pub first_name_overlap: f64,
    /// Added when both sides have >=2 tokens and last tokens match.
    pub last_name_overlap: f64,
    /// Added when candidate initials equal the user's precomputed initials.
    pub initials_match: f64,

    /// Min and max results to return; the max is used.
    pub top_k_results: (usize, usize),
    pub max_candidates: usize,
    pub max_variants_per_candidate: usize,
    /// Cleaned description is truncated to this many characters.
    pub max_description_length: usize,

    /// Soft wall-clock budget for the embedding comparison loop.
    pub embedding_timeout_ms: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_accept: 70.0,
            emb_accept: 0.75,
            anchor_bonus: 5.0,
            cc_penalty: -8.0,
            err_penalty: -5.0,
            first_name_overlap: 5.0,
            last_name_overlap: 5.0,
            initials_match: 3.0,
            top_k_results: (3, 5),
            max_candidates: 5,
            max_variants_per_candidate: 8,
            max_description_length: 1000,
            embedding_timeout_ms: 200,
        }
    }
}

impl MatcherConfig {
    /// Result count to surface (max of the configured range).
    pub fn top_k(&self) -> usize {
        self.top_k_results.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let config = MatcherConfig::default();
        assert_eq!(config.fuzzy_accept, 70.0);
        assert_eq!(config.emb_accept, 0.75);
        assert_eq!(config.top_k(), 5);
        assert_eq!(config.max_variants_per_candidate, 8);
    }
}

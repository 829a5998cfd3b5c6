// src/pipeline.rs
// Orchestrator: drives clean -> extract -> variants -> fuzzy -> embedding
// fallback -> disambiguate -> top-K, and owns the request-scoped metrics
// and diagnostics. The roster and embedder are injected once at
// construction and shared read-only across requests.

use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::config::MatcherConfig;
use crate::matching::{
    disambiguate, extract_candidates, CandidateNormalizer, EmbeddingMatcher, FuzzyMatcher,
};
use crate::models::{
    Candidate, CandidateVariant, MatchCandidate, MatchError, MatchFlag, MatchMethod,
    MatchResponse, MatchedUser, Roster,
};
use crate::observability::{MatchMetrics, RequestDiagnostics};
use crate::preprocessing::text_cleaner::{hard_clean, soft_clean};
use crate::EmbeddingPipeline;

/// Name-resolution service over one immutable roster snapshot. Swapping the
/// roster means constructing a new service, never mutating this one.
pub struct MatcherService {
    roster: Arc<Roster>,
    embedder: Arc<dyn EmbeddingPipeline>,
    config: MatcherConfig,
    normalizer: CandidateNormalizer,
    metrics: MatchMetrics,
}

impl MatcherService {
    pub fn new(
        roster: Arc<Roster>,
        embedder: Arc<dyn EmbeddingPipeline>,
        config: MatcherConfig,
    ) -> Self {
        let normalizer = CandidateNormalizer::new(roster.token_dictionary.clone());
        Self {
            roster,
            embedder,
            config,
            normalizer,
            metrics: MatchMetrics::new(),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MatchMetrics {
        &self.metrics
    }

    /// Resolve the counterparty named in a transaction looked up by id.
    pub fn resolve_transaction(
        &self,
        index: &TransactionIndex,
        transaction_id: &str,
    ) -> Result<MatchResponse, MatchError> {
        let description = index.description(transaction_id)?;
        if description.trim().is_empty() {
            return Ok(MatchResponse::empty());
        }
        Ok(self.match_description(transaction_id, description))
    }

    /// Run the full pipeline over one description. Zero qualifying matches
    /// is a successful empty response, never an error.
    pub fn match_description(&self, transaction_id: &str, description: &str) -> MatchResponse {
        let start = Instant::now();

        let soft_cleaned = soft_clean(description, Some(self.config.max_description_length));
        let mut candidates = extract_candidates(&soft_cleaned, self.config.max_candidates);

        let mut hard_cleaned: Option<String> = None;
        if candidates.is_empty() {
            let hard = hard_clean(description, Some(self.config.max_description_length));
            candidates = extract_candidates(&hard, self.config.max_candidates);
            if candidates.is_empty() && hard.split_whitespace().count() < 2 {
                self.metrics.record_no_match();
                self.emit_diagnostics(
                    transaction_id,
                    None,
                    &candidates,
                    &[],
                    start,
                    &soft_cleaned,
                    Some(hard.as_str()),
                );
                return MatchResponse::empty();
            }
            hard_cleaned = Some(hard);
        }

        let variants = self.expand_variants(&candidates);

        let fuzzy_matcher = FuzzyMatcher::new(&self.config);
        let mut matches = fuzzy_matcher.fuzzy_match(
            &variants,
            &self.roster,
            self.config.fuzzy_accept,
            description,
        );
        let mut method = MatchMethod::Fuzzy;
        let top_score = matches.first().map(|m| m.score).unwrap_or(0.0);

        if matches.is_empty() || top_score < self.config.fuzzy_accept {
            let embedding_matcher = EmbeddingMatcher::new(&self.config, self.embedder.as_ref());
            let outcome = embedding_matcher.embedding_match(
                &variants,
                &self.roster,
                self.config.emb_accept,
                self.config.embedding_timeout_ms,
            );
            if outcome.inference_failed {
                // Degrade to whatever the lexical pass produced.
                self.metrics.record_error();
            } else if let Some(best) = outcome.matches.first() {
                if best.score / 100.0 >= self.config.emb_accept {
                    method = MatchMethod::Embedding;
                    matches = outcome.matches;
                }
            }
        }

        if matches.is_empty() {
            self.metrics.record_no_match();
            self.emit_diagnostics(
                transaction_id,
                None,
                &candidates,
                &[],
                start,
                &soft_cleaned,
                hard_cleaned.as_deref(),
            );
            return MatchResponse::empty();
        }

        let mut ranked = disambiguate(matches, &candidates, description, &self.config);
        ranked.truncate(self.config.top_k());

        match method {
            MatchMethod::Fuzzy => self.metrics.record_fuzzy(),
            MatchMethod::Embedding => self.metrics.record_embedding(),
        }
        self.emit_diagnostics(
            transaction_id,
            Some(method),
            &candidates,
            &ranked,
            start,
            &soft_cleaned,
            hard_cleaned.as_deref(),
        );

        let users: Vec<MatchedUser> = ranked
            .iter()
            .map(|m| MatchedUser {
                id: m.user_id.clone(),
                name: m.user_name.clone(),
                match_metric: (m.score * 100.0).round() / 100.0,
                method: m.method,
            })
            .collect();
        let total = users.len();
        MatchResponse {
            users,
            total_number_of_matches: total,
        }
    }

    /// Expand every candidate into variants, deduplicated across candidates
    /// (first candidate to produce a variant text keeps it).
    fn expand_variants(&self, candidates: &[Candidate]) -> Vec<CandidateVariant> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut variants = Vec::new();
        for candidate in candidates {
            for text in self
                .normalizer
                .generate_variants(&candidate.text, self.config.max_variants_per_candidate)
            {
                if seen.insert(text.clone()) {
                    variants.push(CandidateVariant {
                        text,
                        source_candidate_text: candidate.text.clone(),
                    });
                }
            }
        }
        debug!("Expanded {} candidates into {} variants", candidates.len(), variants.len());
        variants
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_diagnostics(
        &self,
        transaction_id: &str,
        method: Option<MatchMethod>,
        candidates: &[Candidate],
        ranked: &[MatchCandidate],
        start: Instant,
        soft_cleaned: &str,
        hard_cleaned: Option<&str>,
    ) {
        let scores: Vec<f64> = ranked.iter().map(|m| m.score).collect();
        let anchor = candidates.first().map(|c| c.anchor.as_str().to_string());
        let penalty_applied = ranked
            .iter()
            .any(|m| m.flags.contains(&MatchFlag::CcPenaltyApplied));
        let bonus_applied = ranked
            .iter()
            .any(|m| m.flags.contains(&MatchFlag::AnchorBonusApplied));
        RequestDiagnostics::new(
            transaction_id,
            method,
            candidates.iter().map(|c| c.text.clone()).collect(),
            &scores,
            start.elapsed().as_secs_f64() * 1000.0,
            anchor,
            penalty_applied,
            bonus_applied,
            soft_cleaned,
            hard_cleaned,
        )
        .emit();
    }
}

/// Transaction id -> description lookup, the surrounding surface the
/// pipeline is invoked through. An unknown id is a distinct error, never an
/// empty match list.
#[derive(Debug, Default)]
pub struct TransactionIndex {
    descriptions: HashMap<String, String>,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            descriptions: records.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, description: impl Into<String>) {
        self.descriptions.insert(id.into(), description.into());
    }

    pub fn description(&self, id: &str) -> Result<&str, MatchError> {
        self.descriptions
            .get(id)
            .map(String::as_str)
            .ok_or(MatchError::TransactionNotFound)
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

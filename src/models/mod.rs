// src/models/mod.rs
// Core data types shared across the matching pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Textual pattern that produced a candidate. Closed set so priority
/// ordering and disambiguation stay exhaustively matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    From,
    Ref,
    BeforeForDeel,
    Fallback,
}

impl Anchor {
    /// Extraction priority; higher wins.
    pub fn priority(&self) -> u8 {
        match self {
            Anchor::From => 3,
            Anchor::Ref => 2,
            Anchor::BeforeForDeel => 1,
            Anchor::Fallback => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::From => "from",
            Anchor::Ref => "ref",
            Anchor::BeforeForDeel => "for_deel",
            Anchor::Fallback => "fallback",
        }
    }
}

/// A span of cleaned text hypothesized to contain a person's name.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub anchor: Anchor,
    /// Offsets into the cleaned text the candidate was extracted from.
    pub span: (usize, usize),
}

impl Candidate {
    pub fn priority(&self) -> u8 {
        self.anchor.priority()
    }
}

/// Scoring method that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Fuzzy,
    Embedding,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::Embedding => "embedding",
        }
    }
}

/// Score adjustments applied during disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchFlag {
    AnchorBonusApplied,
    CcPenaltyApplied,
}

/// One textual variant of a candidate, carrying provenance back to the
/// candidate it was generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateVariant {
    pub text: String,
    pub source_candidate_text: String,
}

/// Transient scoring record for one (variant, user) pair. Request-scoped.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub user_id: String,
    pub user_name: String,
    /// Variant text that produced this match.
    pub variant: String,
    /// Text of the candidate the variant was generated from.
    pub source_candidate_text: String,
    /// Always clamped to [0, 100] before being surfaced.
    pub score: f64,
    pub method: MatchMethod,
    pub flags: HashSet<MatchFlag>,
}

impl MatchCandidate {
    pub fn clamp_score(&mut self) {
        self.score = self.score.clamp(0.0, 100.0);
    }
}

/// One precomputed user identity record. Built once, read-only thereafter.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    /// Original display name, surfaced verbatim in responses.
    pub display_name: String,
    /// Diacritics stripped, lowercased, whitespace collapsed.
    pub normalized_name: String,
    pub tokens: Vec<String>,
    /// First character of each token, uppercased.
    pub initials: String,
    pub embedding: Vec<f32>,
}

/// Immutable roster snapshot shared across requests. Replacing it means
/// building a new snapshot, never mutating records in place.
#[derive(Debug, Clone)]
pub struct Roster {
    pub records: Vec<UserRecord>,
    /// Embedding dimension, identical across every record.
    pub embedding_dim: usize,
    /// Union of all user name tokens, used for glued-token splitting.
    pub token_dictionary: HashSet<String>,
}

/// One entry in the caller-facing ranked result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedUser {
    pub id: String,
    pub name: String,
    /// 0-100, rounded to 2 decimals.
    pub match_metric: f64,
    pub method: MatchMethod,
}

/// Final response shape for one resolution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub users: Vec<MatchedUser>,
    pub total_number_of_matches: usize,
}

impl MatchResponse {
    pub fn empty() -> Self {
        Self {
            users: Vec::new(),
            total_number_of_matches: 0,
        }
    }
}

/// Caller-facing failures. Zero qualifying matches is NOT an error; it is an
/// empty `MatchResponse`.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The surrounding transaction lookup failed.
    #[error("Transaction not found")]
    TransactionNotFound,
    /// Roster construction rejected inconsistent input (e.g. an embedding
    /// whose dimension disagrees with the rest of the roster).
    #[error("invalid roster: {0}")]
    InvalidRoster(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_priority_ordering() {
        assert!(Anchor::From.priority() > Anchor::Ref.priority());
        assert!(Anchor::Ref.priority() > Anchor::BeforeForDeel.priority());
        assert!(Anchor::BeforeForDeel.priority() > Anchor::Fallback.priority());
    }

    #[test]
    fn method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatchMethod::Embedding).unwrap(),
            "\"embedding\""
        );
        assert_eq!(MatchMethod::Fuzzy.as_str(), "fuzzy");
    }

    #[test]
    fn score_clamped_to_bounds() {
        let mut m = MatchCandidate {
            user_id: "u1".into(),
            user_name: "Emma Brown".into(),
            variant: "emma brown".into(),
            source_candidate_text: "emma brown".into(),
            score: 113.0,
            method: MatchMethod::Fuzzy,
            flags: HashSet::new(),
        };
        m.clamp_score();
        assert_eq!(m.score, 100.0);
        m.score = -4.0;
        m.clamp_score();
        assert_eq!(m.score, 0.0);
    }

    #[test]
    fn not_found_error_message() {
        assert_eq!(
            MatchError::TransactionNotFound.to_string(),
            "Transaction not found"
        );
    }
}

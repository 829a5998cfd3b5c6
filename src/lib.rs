// src/lib.rs
//! Counterparty name resolution for noisy transaction descriptions.
//!
//! Given a description like "Transfer from Emma Brown for Deel" and a
//! read-only roster of user identity records, the pipeline cleans the text,
//! extracts candidate name spans, expands them into variants, scores them
//! lexically, falls back to embedding similarity when the lexical pass is
//! weak, and returns a ranked, score-bounded match list.

pub mod config;
pub mod embedder;
pub mod matching;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod preprocessing;
pub mod utils;

pub use config::MatcherConfig;
pub use embedder::CharGramEmbedder;
pub use models::{
    Anchor, Candidate, CandidateVariant, MatchCandidate, MatchError, MatchMethod, MatchResponse,
    MatchedUser, Roster, UserRecord,
};
pub use observability::MatchMetrics;
pub use pipeline::{MatcherService, TransactionIndex};
pub use preprocessing::roster::RosterBuilder;

/// Embedding pipeline trait for generating vector representations of text.
///
/// Implementors produce fixed-dimension vectors; the roster builder and the
/// embedding matcher both go through this seam so the model backend can be
/// swapped without touching the pipeline.
pub trait EmbeddingPipeline: Send + Sync {
    /// Generate an embedding for a single text.
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;
}

// src/observability/mod.rs
// Request metrics and structured per-request diagnostics. Counters are
// process-wide atomics; diagnostics are emitted through the logger as one
// JSON object per request so downstream collection stays external.

use chrono::Utc;
use log::info;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::MatchMethod;

/// Cleaned description text longer than this is fingerprinted rather than
/// logged verbatim.
const SNIPPET_MAX_CHARS: usize = 50;

/// Process-wide counters over resolution outcomes.
#[derive(Debug, Default)]
pub struct MatchMetrics {
    fuzzy_matches: AtomicU64,
    embedding_matches: AtomicU64,
    no_matches: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub fuzzy_matches: u64,
    pub embedding_matches: u64,
    pub no_matches: u64,
    pub errors: u64,
}

impl MatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fuzzy(&self) {
        self.fuzzy_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_embedding(&self) {
        self.embedding_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_match(&self) {
        self.no_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fuzzy_matches: self.fuzzy_matches.load(Ordering::Relaxed),
            embedding_matches: self.embedding_matches.load(Ordering::Relaxed),
            no_matches: self.no_matches.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// One structured record per resolution request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDiagnostics {
    pub timestamp: String,
    pub transaction_id: String,
    pub method: Option<MatchMethod>,
    pub candidates: Vec<String>,
    pub top_score: f64,
    pub num_matches: usize,
    pub duration_ms: f64,
    pub anchor: Option<String>,
    pub penalty_applied: bool,
    pub bonus_applied: bool,
    pub soft_cleaned: String,
    pub hard_cleaned: Option<String>,
}

impl RequestDiagnostics {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transaction_id: &str,
        method: Option<MatchMethod>,
        candidates: Vec<String>,
        scores: &[f64],
        duration_ms: f64,
        anchor: Option<String>,
        penalty_applied: bool,
        bonus_applied: bool,
        soft_cleaned: &str,
        hard_cleaned: Option<&str>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            transaction_id: transaction_id.to_string(),
            method,
            candidates,
            top_score: scores.iter().cloned().fold(0.0, f64::max),
            num_matches: scores.len(),
            duration_ms,
            anchor,
            penalty_applied,
            bonus_applied,
            soft_cleaned: fingerprint_snippet(soft_cleaned),
            hard_cleaned: hard_cleaned.map(fingerprint_snippet),
        }
    }

    /// Emit the record as a single JSON line.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(line) => info!("match_request {}", line),
            Err(e) => info!(
                "match_request (unserializable: {}) transaction_id={}",
                e, self.transaction_id
            ),
        }
    }
}

/// Short text passes through untouched; longer text is truncated to
/// `SNIPPET_MAX_CHARS` characters and suffixed with 8 hex digits of its
/// SHA-256 digest so log lines stay comparable without carrying raw
/// descriptions.
pub fn fingerprint_snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }
    let digest = Sha256::digest(text.as_bytes());
    let prefix: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
    format!("{}...{}", prefix, &hex::encode(digest)[..8])
}

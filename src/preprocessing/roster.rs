// src/preprocessing/roster.rs
// One-time construction of the read-only user roster: name normalization,
// tokenization, initials, and batch embedding with dimension validation.

use log::{debug, info};
use std::collections::HashSet;

use crate::models::{MatchError, Roster, UserRecord};
use crate::utils::strip_accents;
use crate::EmbeddingPipeline;

/// Builds an immutable `Roster` snapshot from raw (id, display name) pairs.
/// Replacing a roster means building a new snapshot and swapping the whole
/// thing; records are never mutated while requests are served.
pub struct RosterBuilder<'a> {
    embedder: &'a dyn EmbeddingPipeline,
}

impl<'a> RosterBuilder<'a> {
    pub fn new(embedder: &'a dyn EmbeddingPipeline) -> Self {
        Self { embedder }
    }

    pub fn build(&self, users: &[(String, String)]) -> Result<Roster, MatchError> {
        let mut records: Vec<UserRecord> = Vec::with_capacity(users.len());

        for (id, display_name) in users {
            let id = id.trim();
            let display_name = display_name.trim();
            if id.is_empty() || display_name.is_empty() {
                continue;
            }
            // Placeholder values leaking out of upstream exports.
            let lowered = display_name.to_lowercase();
            if lowered == "nan" || lowered == "none" {
                continue;
            }

            let normalized_name = normalize_name(display_name);
            if normalized_name.is_empty() {
                continue;
            }

            let tokens: Vec<String> = normalized_name
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if tokens.is_empty() {
                continue;
            }

            let initials = generate_initials(&tokens);

            records.push(UserRecord {
                id: id.to_string(),
                display_name: display_name.to_string(),
                normalized_name,
                tokens,
                initials,
                embedding: Vec::new(),
            });
        }

        info!("Preprocessing roster: {} usable records", records.len());

        let names: Vec<&str> = records.iter().map(|r| r.normalized_name.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&names)
            .map_err(|e| MatchError::InvalidRoster(format!("embedding backend failed: {}", e)))?;

        if embeddings.len() != records.len() {
            return Err(MatchError::InvalidRoster(format!(
                "embedding count mismatch: {} vectors for {} records",
                embeddings.len(),
                records.len()
            )));
        }

        let embedding_dim = embeddings.first().map(|e| e.len()).unwrap_or(0);
        for (record, embedding) in records.iter_mut().zip(embeddings) {
            if embedding.len() != embedding_dim {
                return Err(MatchError::InvalidRoster(format!(
                    "embedding dimension mismatch for user {}: {} != {}",
                    record.id,
                    embedding.len(),
                    embedding_dim
                )));
            }
            record.embedding = embedding;
        }

        let mut token_dictionary = HashSet::new();
        for record in &records {
            for token in &record.tokens {
                token_dictionary.insert(token.clone());
            }
        }
        debug!(
            "Roster token dictionary holds {} distinct tokens",
            token_dictionary.len()
        );

        Ok(Roster {
            records,
            embedding_dim,
            token_dictionary,
        })
    }
}

/// Lowercase, strip diacritics, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = strip_accents(&lowered);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First character of each token, uppercased.
pub fn generate_initials(tokens: &[String]) -> String {
    tokens
        .iter()
        .filter_map(|t| t.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

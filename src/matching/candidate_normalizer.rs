// src/matching/candidate_normalizer.rs
// Candidate normalization and bounded variant generation: misspelling
// correction, glued-token splitting against the roster token dictionary,
// reorderings, particle removal, numeric-tail stripping, transliteration.

use std::collections::HashSet;

use crate::matching::misspellings::normalize_misspelling;
use crate::matching::transliteration::{get_transliteration, has_non_latin_chars};
use crate::utils::strip_accents;

/// Tokens dropped when building the particle-free variant.
const PARTICLE_TOKENS: &[&str] = &["jr", "sr"];

/// Tokens longer than this are probed for glued-word splits.
const GLUED_TOKEN_MIN_LEN: usize = 7;

pub struct CandidateNormalizer {
    token_dictionary: HashSet<String>,
}

impl CandidateNormalizer {
    /// `token_dictionary` is the union of all roster name tokens, used to
    /// detect glued tokens like "emmabrown".
    pub fn new(token_dictionary: HashSet<String>) -> Self {
        Self { token_dictionary }
    }

    /// Lowercase, strip diacritics, collapse whitespace. Idempotent.
    pub fn normalize_candidate(&self, candidate: &str) -> String {
        if candidate.is_empty() {
            return String::new();
        }
        let lowered = candidate.to_lowercase();
        let stripped = strip_accents(lowered.trim());
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Expand a raw candidate into at most `max_variants` textual variants.
    /// Insertion order is deterministic; truncation cuts the tail.
    pub fn generate_variants(&self, candidate: &str, max_variants: usize) -> Vec<String> {
        let normalized = self.normalize_candidate(candidate);
        if normalized.is_empty() {
            return Vec::new();
        }

        let corrected = normalize_misspelling(&normalized);
        let normalized = self.split_glued_words(&corrected);

        let mut variants: Vec<String> = Vec::new();
        push_unique(&mut variants, normalized.clone());

        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.is_empty() {
            return variants;
        }

        if tokens.len() == 2 {
            push_unique(&mut variants, format!("{} {}", tokens[1], tokens[0]));
        }

        if tokens.len() > 2 {
            let filtered: Vec<&str> = tokens
                .iter()
                .copied()
                .filter(|t| t.chars().count() > 1 && !PARTICLE_TOKENS.contains(t))
                .collect();
            if filtered.len() >= 2 {
                push_unique(&mut variants, filtered.join(" "));
            }
        }

        // Trailing digits on a token ("brown7") are likely reference noise.
        for token in &tokens {
            let stripped = token.trim_end_matches(|c: char| c.is_ascii_digit());
            if !stripped.is_empty() && stripped != *token {
                let rebuilt: Vec<&str> = tokens
                    .iter()
                    .map(|t| if t == token { stripped } else { *t })
                    .collect();
                push_unique(&mut variants, rebuilt.join(" "));
            }
        }

        // The non-Latin check runs on the raw input; normalization may have
        // already transcribed the script.
        if has_non_latin_chars(candidate) {
            if let Some(transliterated) = get_transliteration(candidate) {
                push_unique(&mut variants, transliterated.to_lowercase());
                let translit_tokens: Vec<&str> = transliterated.split_whitespace().collect();
                if translit_tokens.len() == 2 {
                    push_unique(
                        &mut variants,
                        format!("{} {}", translit_tokens[1], translit_tokens[0])
                            .to_lowercase(),
                    );
                }
            }
        }

        variants.truncate(max_variants);
        variants
    }

    /// Split any long token into two dictionary words, scanning split
    /// positions left to right; first valid split wins.
    fn split_glued_words(&self, text: &str) -> String {
        if self.token_dictionary.is_empty() {
            return text.to_string();
        }

        let mut result_tokens: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            if token.chars().count() >= GLUED_TOKEN_MIN_LEN {
                if let Some((left, right)) = self.try_split_token(token) {
                    result_tokens.push(left);
                    result_tokens.push(right);
                    continue;
                }
            }
            result_tokens.push(token.to_string());
        }
        result_tokens.join(" ")
    }

    fn try_split_token(&self, token: &str) -> Option<(String, String)> {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 5 {
            return None;
        }

        for split_pos in 3..chars.len() - 2 {
            let left: String = chars[..split_pos].iter().collect();
            let right: String = chars[split_pos..].iter().collect();
            if self.known_token(&left) && self.known_token(&right) {
                return Some((left, right));
            }
        }
        None
    }

    fn known_token(&self, token: &str) -> bool {
        self.token_dictionary.contains(token) || self.token_dictionary.contains(&capitalize(token))
    }
}

fn push_unique(variants: &mut Vec<String>, variant: String) {
    if !variant.is_empty() && !variants.contains(&variant) {
        variants.push(variant);
    }
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer_with(tokens: &[&str]) -> CandidateNormalizer {
        CandidateNormalizer::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn normalize_is_idempotent() {
        let n = normalizer_with(&[]);
        let once = n.normalize_candidate("  José   Muñoz ");
        let twice = n.normalize_candidate(&once);
        assert_eq!(once, "jose munoz");
        assert_eq!(once, twice);
    }

    #[test]
    fn two_token_reversal() {
        let n = normalizer_with(&[]);
        let variants = n.generate_variants("Emma Brown", 8);
        assert_eq!(variants[0], "emma brown");
        assert!(variants.contains(&"brown emma".to_string()));
    }

    #[test]
    fn particle_removal_for_long_names() {
        let n = normalizer_with(&[]);
        let variants = n.generate_variants("emma j brown jr", 8);
        assert!(variants.contains(&"emma brown".to_string()));
    }

    #[test]
    fn numeric_tail_stripped_per_token() {
        let n = normalizer_with(&[]);
        let variants = n.generate_variants("emma brown77", 8);
        assert!(variants.contains(&"emma brown".to_string()));
    }

    #[test]
    fn misspelling_correction_applies() {
        let n = normalizer_with(&[]);
        let variants = n.generate_variants("anna talor", 8);
        assert_eq!(variants[0], "anna taylor");
    }

    #[test]
    fn glued_token_split_first_position_wins() {
        let n = normalizer_with(&["emma", "brown"]);
        let variants = n.generate_variants("emmabrown", 8);
        assert_eq!(variants[0], "emma brown");
    }

    #[test]
    fn glued_token_left_intact_without_dictionary_hit() {
        let n = normalizer_with(&["maria", "alvarez"]);
        let variants = n.generate_variants("emmabrown", 8);
        assert_eq!(variants[0], "emmabrown");
    }

    #[test]
    fn transliteration_variants_from_raw_text() {
        let n = normalizer_with(&[]);
        let variants = n.generate_variants("杨陈", 8);
        assert!(variants.contains(&"yang chen".to_string()));
        assert!(variants.contains(&"chen yang".to_string()));
    }

    #[test]
    fn variant_count_bounded() {
        let n = normalizer_with(&[]);
        let variants = n.generate_variants("emma2 j brown3 jr", 3);
        assert!(variants.len() <= 3);
    }

    #[test]
    fn empty_candidate_yields_nothing() {
        let n = normalizer_with(&[]);
        assert!(n.generate_variants("", 8).is_empty());
        assert!(n.generate_variants("   ", 8).is_empty());
    }
}

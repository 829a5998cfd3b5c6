// src/matching/fuzzy.rs
// Lexical scoring of candidate variants against the roster. The base score is
// the maximum of several word-order-invariant and substring-tolerant metrics,
// adjusted by name-structure bonuses and description-context penalties.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::config::MatcherConfig;
use crate::models::{CandidateVariant, MatchCandidate, MatchMethod, Roster, UserRecord};

// Weights for the composite metric.
const JARO_WINKLER_WEIGHT: f64 = 0.6;
const LEVENSHTEIN_WEIGHT: f64 = 0.4;

/// Window, in characters after a standalone "cc" token, inside which a
/// variant is treated as a carbon-copy mention.
const CC_WINDOW_CHARS: usize = 100;

static CC_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcc\b").unwrap());

pub struct FuzzyMatcher<'a> {
    config: &'a MatcherConfig,
}

impl<'a> FuzzyMatcher<'a> {
    pub fn new(config: &'a MatcherConfig) -> Self {
        Self { config }
    }

    /// Score every (variant, user) pair, keep pairs at or above `threshold`,
    /// sorted by score descending.
    pub fn fuzzy_match(
        &self,
        variants: &[CandidateVariant],
        roster: &Roster,
        threshold: f64,
        description: &str,
    ) -> Vec<MatchCandidate> {
        let mut matches = Vec::new();
        let description_lower = description.to_lowercase();

        for variant in variants {
            if variant.text.is_empty() {
                continue;
            }

            for user in &roster.records {
                if user.normalized_name.is_empty() {
                    continue;
                }

                let base_score = compute_base_score(&variant.text, &user.normalized_name);
                let final_score = self
                    .apply_bonuses_penalties(base_score, &variant.text, user, &description_lower)
                    .clamp(0.0, 100.0);

                if final_score >= threshold {
                    matches.push(MatchCandidate {
                        user_id: user.id.clone(),
                        user_name: user.display_name.clone(),
                        variant: variant.text.clone(),
                        source_candidate_text: variant.source_candidate_text.clone(),
                        score: final_score,
                        method: MatchMethod::Fuzzy,
                        flags: HashSet::new(),
                    });
                }
            }
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        debug!(
            "Fuzzy pass: {} pairs at or above threshold {}",
            matches.len(),
            threshold
        );
        matches
    }

    fn apply_bonuses_penalties(
        &self,
        base_score: f64,
        variant: &str,
        user: &UserRecord,
        description_lower: &str,
    ) -> f64 {
        let mut score = base_score;

        let candidate_tokens: Vec<&str> = variant.split_whitespace().collect();
        if user.tokens.is_empty() || candidate_tokens.is_empty() {
            return score;
        }

        if candidate_tokens[0].eq_ignore_ascii_case(&user.tokens[0]) {
            score += self.config.first_name_overlap;
        }

        if candidate_tokens.len() > 1 && user.tokens.len() > 1 {
            let last_candidate = candidate_tokens[candidate_tokens.len() - 1];
            let last_user = &user.tokens[user.tokens.len() - 1];
            if last_candidate.eq_ignore_ascii_case(last_user) {
                score += self.config.last_name_overlap;
            }
        }

        if !user.initials.is_empty() {
            let candidate_initials: String = candidate_tokens
                .iter()
                .filter_map(|t| t.chars().next())
                .collect::<String>()
                .to_lowercase();
            if candidate_initials == user.initials.to_lowercase() {
                score += self.config.initials_match;
            }
        }

        if in_cc_window(description_lower, variant) {
            score += self.config.cc_penalty;
        }

        // Fires once per description whenever the marker is present,
        // irrespective of candidate position.
        if description_lower.contains("err#") || description_lower.contains("err #") {
            score += self.config.err_penalty;
        }

        score
    }
}

/// Maximum of full-ratio, partial-overlap, token-sort, token-set and a
/// weighted composite, all on a 0-100 scale.
pub fn compute_base_score(candidate: &str, user_name: &str) -> f64 {
    let scores = [
        full_ratio(candidate, user_name),
        partial_ratio(candidate, user_name),
        token_sort_ratio(candidate, user_name),
        token_set_ratio(candidate, user_name),
        weighted_ratio(candidate, user_name),
    ];
    scores.iter().cloned().fold(0.0, f64::max)
}

fn full_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Best full-ratio of the shorter string against every equal-length character
/// window of the longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = shorter.chars().count();
    let long_chars: Vec<char> = longer.chars().collect();

    if short_len == 0 {
        return 0.0;
    }
    if short_len == long_chars.len() {
        return full_ratio(shorter, longer);
    }

    let mut best: f64 = 0.0;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        best = best.max(full_ratio(shorter, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    full_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Classic token-set construction: compare the sorted intersection against
/// each side's remainder and take the best pairing.
fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();

    let mut intersection: Vec<&str> = set_a.intersection(&set_b).cloned().collect();
    let mut only_a: Vec<&str> = set_a.difference(&set_b).cloned().collect();
    let mut only_b: Vec<&str> = set_b.difference(&set_a).cloned().collect();
    intersection.sort_unstable();
    only_a.sort_unstable();
    only_b.sort_unstable();

    let base = intersection.join(" ");
    let combined_a = join_nonempty(&base, &only_a.join(" "));
    let combined_b = join_nonempty(&base, &only_b.join(" "));

    [
        full_ratio(&base, &combined_a),
        full_ratio(&base, &combined_b),
        full_ratio(&combined_a, &combined_b),
    ]
    .iter()
    .cloned()
    .fold(0.0, f64::max)
}

fn weighted_ratio(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 100.0 * JARO_WINKLER_WEIGHT + full_ratio(a, b) * LEVENSHTEIN_WEIGHT
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

/// True when the variant text occurs within `CC_WINDOW_CHARS` characters
/// after the first standalone "cc" token of the description.
fn in_cc_window(description_lower: &str, variant: &str) -> bool {
    let cc_byte_pos = match CC_TOKEN.find(description_lower) {
        Some(m) => m.start(),
        None => return false,
    };
    let variant_byte_pos = match description_lower.find(&variant.to_lowercase()) {
        Some(p) => p,
        None => return false,
    };

    let cc_pos = description_lower[..cc_byte_pos].chars().count();
    let variant_pos = description_lower[..variant_byte_pos].chars().count();
    variant_pos > cc_pos && variant_pos < cc_pos + CC_WINDOW_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> UserRecord {
        let normalized = name.to_lowercase();
        let tokens: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        let initials: String = tokens
            .iter()
            .filter_map(|t| t.chars().next())
            .flat_map(|c| c.to_uppercase())
            .collect();
        UserRecord {
            id: id.to_string(),
            display_name: name.to_string(),
            normalized_name: normalized,
            tokens,
            initials,
            embedding: Vec::new(),
        }
    }

    fn roster(users: Vec<UserRecord>) -> Roster {
        Roster {
            records: users,
            embedding_dim: 0,
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
    fn exact_match_scores_at_ceiling() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown")]);

        let matches = matcher.fuzzy_match(&[variant("emma brown")], &roster, 70.0, "");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].user_id, "u1");
        assert_eq!(matches[0].score, 100.0);
    }

    #[test]
    fn reversed_tokens_still_score_high() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown")]);

        let matches = matcher.fuzzy_match(&[variant("brown emma")], &roster, 70.0, "");
        assert!(!matches.is_empty());
        assert!(matches[0].score >= 95.0);
    }

    #[test]
    fn unrelated_name_filtered_by_threshold() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown")]);

        let matches = matcher.fuzzy_match(&[variant("xavier quintana")], &roster, 70.0, "");
        assert!(matches.is_empty());
    }

    #[test]
    fn cc_region_reduces_score() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown")]);

        let plain = matcher.fuzzy_match(
            &[variant("emma braun")],
            &roster,
            0.0,
            "payment emma braun",
        );
        let penalized = matcher.fuzzy_match(
            &[variant("emma braun")],
            &roster,
            0.0,
            "cc emma braun",
        );
        assert_eq!(
            penalized[0].score,
            (plain[0].score + config.cc_penalty).clamp(0.0, 100.0)
        );
    }

    #[test]
    fn cc_must_be_standalone_token() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown")]);

        // "account" contains "cc" as a substring; no penalty expected.
        let a = matcher.fuzzy_match(
            &[variant("emma braun")],
            &roster,
            0.0,
            "account emma braun",
        );
        let b = matcher.fuzzy_match(&[variant("emma braun")], &roster, 0.0, "emma braun");
        assert_eq!(a[0].score, b[0].score);
    }

    #[test]
    fn err_marker_reduces_score_once() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown")]);

        let plain = matcher.fuzzy_match(&[variant("emma braun")], &roster, 0.0, "emma braun");
        let marked = matcher.fuzzy_match(
            &[variant("emma braun")],
            &roster,
            0.0,
            "err# 42 emma braun",
        );
        assert_eq!(
            marked[0].score,
            (plain[0].score + config.err_penalty).clamp(0.0, 100.0)
        );
    }

    #[test]
    fn initials_bonus_applies() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let with_matching = roster(vec![user("u1", "Edward Bell")]);

        // "e bell" initials: "eb" == Edward Bell's "EB".
        let matches = matcher.fuzzy_match(&[variant("e bell")], &with_matching, 0.0, "");
        assert!(!matches.is_empty());
    }

    #[test]
    fn results_sorted_descending() {
        let config = MatcherConfig::default();
        let matcher = FuzzyMatcher::new(&config);
        let roster = roster(vec![user("u1", "Emma Brown"), user("u2", "Emmy Browne")]);

        let matches = matcher.fuzzy_match(&[variant("emma brown")], &roster, 0.0, "");
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(matches[0].user_id, "u1");
    }

    #[test]
    fn partial_ratio_tolerates_substrings() {
        assert!(partial_ratio("emma", "emma brown") >= 99.0);
    }

    #[test]
    fn token_set_ignores_duplicate_tokens() {
        assert!(token_set_ratio("emma emma brown", "emma brown") >= 99.0);
    }
}

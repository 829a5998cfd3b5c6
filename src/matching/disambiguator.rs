// src/matching/disambiguator.rs
// Final arbitration across competing candidates and users: anchor-priority
// bonus, CC-region penalty, compound-name preference, then ranking.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::MatcherConfig;
use crate::models::{Anchor, Candidate, MatchCandidate, MatchFlag};

/// Window, in characters after a standalone "cc" token, treated as a
/// carbon-copy region during disambiguation.
const CC_REGION_CHARS: usize = 200;

/// Boost for a >=3-token match over a qualifying 2-token match of the same
/// user.
const COMPOUND_NAME_BOOST: f64 = 2.0;

static CC_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcc\b").unwrap());

/// Apply anchor bonuses, CC-region penalties and compound-name preference,
/// clamp, and produce the final ranked order.
pub fn disambiguate(
    mut matches: Vec<MatchCandidate>,
    candidates: &[Candidate],
    description: &str,
    config: &MatcherConfig,
) -> Vec<MatchCandidate> {
    if matches.is_empty() {
        return matches;
    }

    let candidate_lookup: HashMap<String, Anchor> = candidates
        .iter()
        .map(|c| (c.text.to_lowercase(), c.anchor))
        .collect();
    let primary_anchor = primary_anchor(candidates);
    let description_lower = description.to_lowercase();

    for m in matches.iter_mut() {
        let source_key = m.source_candidate_text.to_lowercase();
        if let Some(anchor) = candidate_lookup.get(&source_key) {
            if *anchor == primary_anchor {
                m.score += config.anchor_bonus;
                m.flags.insert(MatchFlag::AnchorBonusApplied);
            }
            if in_cc_region(&description_lower, &source_key) {
                m.score += config.cc_penalty;
                m.flags.insert(MatchFlag::CcPenaltyApplied);
            }
        }
    }

    prefer_compound_names(&mut matches, config);

    for m in matches.iter_mut() {
        m.clamp_score();
    }

    // Ties on score fall back to comparing user ids as if sorting
    // descending, so the lexicographically larger id wins.
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.user_id.cmp(&a.user_id))
    });

    matches
}

/// Anchor of the highest-priority candidate; first wins on ties.
fn primary_anchor(candidates: &[Candidate]) -> Anchor {
    let mut primary = Anchor::Fallback;
    let mut best_priority = None;
    for candidate in candidates {
        let priority = candidate.priority();
        if best_priority.map_or(true, |best| priority > best) {
            best_priority = Some(priority);
            primary = candidate.anchor;
        }
    }
    primary
}

/// True when the candidate text occurs within `CC_REGION_CHARS` characters
/// after any standalone "cc" token of the description.
fn in_cc_region(description_lower: &str, candidate_lower: &str) -> bool {
    for m in CC_TOKEN.find_iter(description_lower) {
        let region: String = description_lower[m.start()..]
            .chars()
            .take(CC_REGION_CHARS)
            .collect();
        if region.contains(candidate_lower) {
            return true;
        }
    }
    false
}

/// When a user's richest surviving match has >=3 tokens and a competing
/// 2-token match for the same user already clears the fuzzy-accept
/// threshold, boost the richer match once.
fn prefer_compound_names(matches: &mut [MatchCandidate], config: &MatcherConfig) {
    let mut by_user: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, m) in matches.iter().enumerate() {
        by_user.entry(m.user_id.as_str()).or_default().push(idx);
    }

    let mut boosts: Vec<usize> = Vec::new();
    for indices in by_user.values() {
        if indices.len() < 2 {
            continue;
        }

        let richest = indices
            .iter()
            .copied()
            .max_by_key(|&i| matches[i].variant.split_whitespace().count());
        let richest = match richest {
            Some(i) => i,
            None => continue,
        };

        let top_tokens = matches[richest].variant.split_whitespace().count();
        if top_tokens < 3 {
            continue;
        }

        let has_qualifying_partial = indices.iter().any(|&i| {
            i != richest
                && matches[i].variant.split_whitespace().count() == 2
                && matches[i].score >= config.fuzzy_accept
        });
        if has_qualifying_partial {
            boosts.push(richest);
        }
    }

    for idx in boosts {
        matches[idx].score += COMPOUND_NAME_BOOST;
    }
}

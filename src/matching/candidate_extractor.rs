// src/matching/candidate_extractor.rs
// Candidate name extraction from soft-cleaned transaction text. Each anchor
// heuristic runs independently over the same text; hits are pooled, filtered,
// prioritized and deduplicated.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Anchor, Candidate};

/// Boilerplate words a candidate may not consist of entirely.
pub const BOILERPLATE_WORDS: &[&str] = &[
    "from", "for", "deel", "payment", "transfer", "received", "request", "credit", "debit", "to",
    "cntr", "wise", "test",
];

// "from <name>" until " for", comma, or end.
static AFTER_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s+([^,]+?)(?:\s+for\b|,|$)").unwrap());

// "ref: <name>" until cntr/for/and/cc, comma, or end.
static AFTER_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bref\s*:\s*([^,]+?)(?:\s+(?:cntr|for|and|cc)\b|,|$)").unwrap());

// "<name> for deel"
static BEFORE_FOR_DEEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(.+?)\s+for\s+deel\b").unwrap());

const TRIM_PUNCT: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '-', '[', ']', '{', '}', '"', '\'',
];

/// Extract up to `max_candidates` candidates from soft-cleaned text,
/// ordered by (anchor priority desc, text length desc), deduplicated by
/// case-insensitive text.
pub fn extract_candidates(cleaned_text: &str, max_candidates: usize) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    extract_anchored(cleaned_text, &AFTER_FROM, Anchor::From, &mut candidates);
    extract_anchored(cleaned_text, &AFTER_REF, Anchor::Ref, &mut candidates);
    extract_before_for_deel(cleaned_text, &mut candidates);

    if candidates.is_empty() {
        fallback_windows(cleaned_text, &mut candidates);
    }

    let mut candidates = post_filter(candidates);

    candidates.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then(b.text.chars().count().cmp(&a.text.chars().count()))
    });

    let mut seen = Vec::new();
    let mut unique = Vec::new();
    for candidate in candidates {
        let key = candidate.text.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        unique.push(candidate);
        if unique.len() >= max_candidates {
            break;
        }
    }

    unique
}

fn extract_anchored(text: &str, pattern: &Regex, anchor: Anchor, out: &mut Vec<Candidate>) {
    for caps in pattern.captures_iter(text) {
        if let Some(group) = caps.get(1) {
            let name_text = group.as_str().trim();
            if is_valid_candidate(name_text) {
                out.push(Candidate {
                    text: name_text.to_string(),
                    anchor,
                    span: (group.start(), group.end()),
                });
            }
        }
    }
}

fn extract_before_for_deel(text: &str, out: &mut Vec<Candidate>) {
    for caps in BEFORE_FOR_DEEL.captures_iter(text) {
        let group = match caps.get(1) {
            Some(g) => g,
            None => continue,
        };
        let before_text = group.as_str().trim();
        let words: Vec<&str> = before_text.split_whitespace().collect();
        if words.len() < 2 {
            continue;
        }
        // The name is assumed to be the trailing tokens right before the phrase.
        let name_words = if words.len() >= 4 {
            &words[words.len() - 4..]
        } else {
            &words[..]
        };
        let name_text = name_words.join(" ");
        if is_valid_candidate(&name_text) {
            out.push(Candidate {
                text: name_text,
                anchor: Anchor::BeforeForDeel,
                span: (group.start(), group.end()),
            });
        }
    }
}

/// Last resort: sliding windows of 2-4 tokens keeping any window with at
/// least two alphabetic tokens.
fn fallback_windows(text: &str, out: &mut Vec<Candidate>) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return;
    }

    for window_size in [2usize, 3, 4] {
        if words.len() < window_size {
            continue;
        }
        for i in 0..=(words.len() - window_size) {
            let window = &words[i..i + window_size];
            let alpha_count = window
                .iter()
                .filter(|w| w.chars().any(char::is_alphabetic))
                .count();
            let window_text = window.join(" ");
            if alpha_count >= 2 && is_valid_candidate(&window_text) {
                out.push(Candidate {
                    text: window_text,
                    anchor: Anchor::Fallback,
                    span: (i, i + window_size),
                });
            }
        }
    }
}

fn is_valid_candidate(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < 2 {
        return false;
    }

    let words: Vec<String> = trimmed
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if words.is_empty() || words.len() > 6 {
        return false;
    }
    if words.iter().all(|w| BOILERPLATE_WORDS.contains(&w.as_str())) {
        return false;
    }

    // Unicode letters count here so transliterable non-Latin names survive.
    trimmed.chars().any(char::is_alphabetic)
}

/// Strip surrounding punctuation and re-check the token bound.
fn post_filter(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut filtered = Vec::new();
    for mut candidate in candidates {
        let cleaned = candidate
            .text
            .trim_matches(|c: char| TRIM_PUNCT.contains(&c))
            .trim()
            .to_string();
        if cleaned.is_empty() {
            continue;
        }
        let word_count = cleaned.split_whitespace().count();
        if word_count == 0 || word_count > 6 {
            continue;
        }
        candidate.text = cleaned;
        filtered.push(candidate);
    }
    filtered
}

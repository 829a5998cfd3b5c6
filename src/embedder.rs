// src/embedder.rs
// Deterministic character-trigram hashing embedder. Stands in for a real
// sentence-embedding backend behind the `EmbeddingPipeline` seam: identical
// text always maps to an identical L2-normalized vector, and near-identical
// names share most trigrams, so cosine similarity is still meaningful.

use crate::utils::l2_normalize;
use crate::EmbeddingPipeline;

const DEFAULT_DIM: usize = 384;

pub struct CharGramEmbedder {
    dim: usize,
}

impl CharGramEmbedder {
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "embedding dimension must be non-zero");
        Self { dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl Default for CharGramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl EmbeddingPipeline for CharGramEmbedder {
    fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];

        // Pad so leading/trailing characters contribute full trigrams.
        let padded: Vec<char> = std::iter::once(' ')
            .chain(text.to_lowercase().chars())
            .chain(std::iter::once(' '))
            .collect();

        if padded.len() >= 3 {
            for window in padded.windows(3) {
                let hash = fnv1a(window);
                let idx = (hash % self.dim as u64) as usize;
                let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
                vector[idx] += sign;
            }
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for c in chars {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).as_bytes() {
            hash ^= *b as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
    }
    hash
}

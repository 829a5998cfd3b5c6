// src/utils/mod.rs

pub mod candle;

pub use candle::cosine_similarity_candle;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Strip diacritics by NFD-decomposing and dropping combining marks.
/// Non-Latin scripts (CJK, Greek base letters, Hebrew) pass through.
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_latin_diacritics() {
        assert_eq!(strip_accents("José Muñoz"), "Jose Munoz");
        assert_eq!(strip_accents("Müller"), "Muller");
    }

    #[test]
    fn leaves_non_latin_scripts() {
        assert_eq!(strip_accents("杨陈"), "杨陈");
    }

    #[test]
    fn l2_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}

//! Deterministic lexical embedding for schedule documents.
//!
//! Feature hashing over lowercase tokens with `blake3`. Ids such as
//! `Dr_Smith` or `Neuro_Theatre` split on `_`, so a query for "neuro"
//! lands near every document mentioning the neuro theatre. This is a stable
//! offline baseline, not a neural model.

use blake3::Hasher;

/// Default embedding dimensionality.
pub const DEFAULT_EMBEDDING_DIM: usize = 128;

/// Tokens too common in schedule descriptions to carry meaning.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "for", "in", "is", "of", "on", "the", "to", "with",
];

fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
}

/// Maps text to fixed-size, L2-normalized vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalEmbedder {
    dim: usize,
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl LexicalEmbedder {
    /// Creates an embedder producing `dim`-sized vectors.
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Output dimensionality.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Embeds `text`. Text with no tokens yields the zero vector.
    #[must_use]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }

        let mut vec = vec![0.0f32; self.dim];
        for token in tokenize(&text.to_ascii_lowercase()) {
            let mut h = Hasher::new();
            h.update(token.as_bytes());
            let hash = h.finalize();
            let bytes = hash.as_bytes();

            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&bytes[..8]);
            #[allow(clippy::cast_possible_truncation)]
            let idx = (u64::from_le_bytes(bucket) % self.dim as u64) as usize;
            let sign = if (bytes[8] & 1) == 0 { 1.0f32 } else { -1.0f32 };
            vec[idx] += sign;
        }

        let norm2: f64 = vec.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
        if norm2 > 0.0 {
            #[allow(clippy::cast_possible_truncation)]
            let inv = norm2.sqrt().recip() as f32;
            for x in &mut vec {
                *x *= inv;
            }
        }
        vec
    }
}

/// Cosine similarity of two vectors; 0 for empty, zero or mismatched input.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (xf, yf) = (f64::from(x), f64::from(y));
        dot += xf * yf;
        norm_a += xf * xf;
        norm_b += yf * yf;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        #[allow(clippy::cast_possible_truncation)]
        let sim = sim as f32;
        sim
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let e = LexicalEmbedder::default();
        assert_eq!(e.embed("Dr_Smith Neuro_Theatre"), e.embed("Dr_Smith Neuro_Theatre"));
    }

    #[test]
    fn dim_is_respected() {
        assert_eq!(LexicalEmbedder::new(13).embed("x").len(), 13);
        assert!(LexicalEmbedder::new(0).embed("x").is_empty());
    }

    #[test]
    fn ids_split_on_underscore() {
        let e = LexicalEmbedder::default();
        let doc = e.embed("Surgeon Dr_Smith works in Neuro_Theatre");
        let near = e.embed("neuro smith");
        let far = e.embed("cardiac bypass recovery");
        assert!(cosine_similarity(&doc, &near) > cosine_similarity(&doc, &far));
    }

    #[test]
    fn stop_words_only_is_zero() {
        let v = LexicalEmbedder::default().embed("the and of");
        assert!(v.iter().all(|&x| x == 0.0));
        assert_eq!(cosine_similarity(&v, &v), 0.0);
    }

    #[test]
    fn cosine_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}

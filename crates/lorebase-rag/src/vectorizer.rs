// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hashed bag-of-words text vectorizer.
//!
//! Terms are FNV-1a hashed into a fixed number of buckets and the resulting
//! term-frequency vector is L2-normalized. Deterministic across runs and
//! builds, so embeddings persisted in the database stay comparable with
//! freshly computed query vectors. No model files, no network.

/// Fixed-dimension term-frequency embedder.
#[derive(Debug, Clone)]
pub struct HashedVectorizer {
    dim: usize,
}

impl HashedVectorizer {
    pub fn new(dim: usize) -> Self {
        // A zero-dimension vectorizer would divide by nothing; clamp.
        Self { dim: dim.max(1) }
    }

    /// Dimension of produced vectors.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a text into an L2-normalized term-frequency vector.
    ///
    /// Texts with no extractable terms produce the zero vector, which has
    /// similarity 0.0 against everything.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        for term in tokenize(text) {
            let bucket = (fnv1a(term.as_bytes()) as usize) % self.dim;
            vector[bucket] += 1.0;
        }
        l2_normalize(&vector)
    }
}

/// Lowercased alphanumeric terms, single characters dropped.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_lowercase())
}

/// FNV-1a 64-bit hash. Stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// L2-normalize a vector. Zero vectors are returned unchanged.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

//! Deterministic placeholder embedding (§4.3, §9). The real embedding model
//! named by `embed_model` in configuration is an external collaborator
//! (§1) this crate never calls directly; what every backend needs in the
//! meantime is a stable, fixed-dimension vector per document so the
//! managed-index backend's native similarity path is actually reachable
//! rather than permanently short-circuited to `None`.
//!
//! The scheme is a hashed bag-of-words: each lowercased token is hashed into
//! one of [`DIMENSIONS`] buckets and accumulates there, then the vector is
//! L2-normalized. Same text, same tokens, same vector, every time.

use sha2::{Digest, Sha256};

pub const DIMENSIONS: usize = 64;

pub fn embed(text: &str) -> Vec<f32> {
    let mut buckets = vec![0f32; DIMENSIONS];

    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if token.is_empty() {
            continue;
        }
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let digest = hasher.finalize();
        let index = (u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize) % DIMENSIONS;
        buckets[index] += 1.0;
    }

    let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut buckets {
            *value /= norm;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_embeds_identically() {
        assert_eq!(embed("ladder blue team"), embed("ladder blue team"));
    }

    #[test]
    fn different_text_embeds_differently() {
        assert_ne!(embed("ladder blue team"), embed("roster white team"));
    }

    #[test]
    fn embedding_is_unit_length_when_non_empty() {
        let v = embed("caroline springs blue u10");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_text_embeds_to_the_zero_vector() {
        assert_eq!(embed(""), vec![0f32; DIMENSIONS]);
    }
}

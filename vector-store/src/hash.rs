use cricket_core::DocumentMetadata;
use sha2::{Digest, Sha256};

/// Stable hash of `(text, sorted metadata)`. Used to decide whether an
/// upsert actually changes anything (§4.3 content-hash dedupe). Metadata
/// entries are already sorted by [`DocumentMetadata::entries`], so two
/// equal entity normalizations hash identically regardless of field order.
pub fn content_hash(text: &str, metadata: &DocumentMetadata) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    for (key, value) in metadata.entries() {
        hasher.update(b"\0");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cricket_core::DocumentKind;

    fn meta() -> DocumentMetadata {
        DocumentMetadata {
            team_id: Some("t1".to_string()),
            season_id: "s1".to_string(),
            grade_id: "g1".to_string(),
            kind: DocumentKind::Fixture,
            date: None,
        }
    }

    #[test]
    fn identical_text_and_metadata_hash_identically() {
        assert_eq!(content_hash("hello", &meta()), content_hash("hello", &meta()));
    }

    #[test]
    fn different_text_hashes_differently() {
        assert_ne!(content_hash("hello", &meta()), content_hash("goodbye", &meta()));
    }
}

use thiserror::Error;

/// Each backend fails independently (§7); the tiered store continues with
/// whichever backends remain healthy rather than surfacing this upward.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("managed index backend error: {0}")]
    ManagedIndex(String),

    #[error("document db backend error: {0}")]
    DocumentDb(String),

    #[error("kv cache backend error: {0}")]
    KvCache(String),

    #[error("local file backend error: {0}")]
    LocalFile(String),

    #[error("no backend is configured")]
    NoBackendConfigured,
}

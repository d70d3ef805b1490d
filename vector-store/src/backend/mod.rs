pub mod document_db;
pub mod kv_cache;
pub mod local_file;
pub mod managed_index;

use crate::contract::StoredDocument;
use crate::error::StoreError;
use async_trait::async_trait;

/// Low-level per-backend contract the tiered store composes. This sits below
/// [`crate::contract::VectorStore`]: backends don't know about dedupe or
/// tiering, they just durably put/get one document at a time.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn put(&self, doc: &StoredDocument) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    async fn all(&self) -> Result<Vec<StoredDocument>, StoreError>;

    async fn health_check(&self) -> bool;

    /// Native similarity search, if this backend variant supports one.
    /// Returns `None` for backends with no semantic search of their own, in
    /// which case the tiered store falls back to lexical scoring over
    /// [`Backend::all`].
    async fn query_similarity(&self, _embedding: Option<&[f32]>, _k: usize) -> Option<Vec<String>> {
        None
    }
}

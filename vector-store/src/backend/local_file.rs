//! Local file backend: a `sled` embedded database on disk. This is the
//! fallback of last resort — the tier that survives a pod restart even when
//! every remote backend is unreachable at startup, and the one object-
//! storage-style mirroring degrades to when the real bucket is unreachable.

use crate::backend::Backend;
use crate::contract::StoredDocument;
use crate::error::StoreError;
use async_trait::async_trait;

pub struct LocalFileBackend {
    tree: sled::Db,
}

impl LocalFileBackend {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let tree = sled::open(path).map_err(|e| StoreError::LocalFile(e.to_string()))?;
        Ok(Self { tree })
    }
}

#[async_trait]
impl Backend for LocalFileBackend {
    fn name(&self) -> &'static str {
        "local_file"
    }

    async fn put(&self, doc: &StoredDocument) -> Result<(), StoreError> {
        let bytes = rmp_serde::to_vec(doc).map_err(|e| StoreError::LocalFile(e.to_string()))?;
        self.tree
            .insert(doc.id.as_bytes(), bytes)
            .map_err(|e| StoreError::LocalFile(e.to_string()))?;
        // Flushing on every write keeps the acknowledged-loss window at
        // zero for this tier, at the cost of write latency; it is meant to
        // be the durable floor, not the fast path.
        self.tree.flush_async().await.map_err(|e| StoreError::LocalFile(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        match self.tree.get(id.as_bytes()).map_err(|e| StoreError::LocalFile(e.to_string()))? {
            Some(bytes) => {
                let doc = rmp_serde::from_slice(&bytes).map_err(|e| StoreError::LocalFile(e.to_string()))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        self.tree
            .iter()
            .values()
            .map(|r| {
                let bytes = r.map_err(|e| StoreError::LocalFile(e.to_string()))?;
                rmp_serde::from_slice(&bytes).map_err(|e| StoreError::LocalFile(e.to_string()))
            })
            .collect()
    }

    async fn health_check(&self) -> bool {
        // `get` on a missing key still returns `Ok(None)`, so a bare
        // existence check can never observe a wedged or corrupted tree.
        // Round-trip a sentinel value instead.
        let probe = b"ok";
        let Ok(()) = self.tree.insert("__health__", probe.as_slice()).map(|_| ()) else {
            return false;
        };
        matches!(self.tree.get("__health__"), Ok(Some(value)) if value.as_ref() == probe)
    }
}

//! Remote key-value cache backend: a Redis-backed tier, fast but with no
//! native similarity search — candidates for lexical fallback scoring come
//! from a full scan via [`Backend::all`], which is expected to be small for
//! a single club's document set.

use crate::backend::Backend;
use crate::contract::StoredDocument;
use crate::error::StoreError;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, Runtime};

const INDEX_KEY: &str = "cricket:documents:index";

pub struct KvCacheBackend {
    pool: Pool,
}

impl KvCacheBackend {
    pub fn new(redis_url: impl Into<String>) -> Result<Self, StoreError> {
        let pool = Config::from_url(redis_url.into())
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::KvCache(e.to_string()))?;
        Ok(Self { pool })
    }

    fn doc_key(id: &str) -> String {
        format!("cricket:document:{id}")
    }
}

#[async_trait]
impl Backend for KvCacheBackend {
    fn name(&self) -> &'static str {
        "kv_cache"
    }

    async fn put(&self, doc: &StoredDocument) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(|e| StoreError::KvCache(e.to_string()))?;
        let payload = serde_json::to_string(doc).map_err(|e| StoreError::KvCache(e.to_string()))?;
        conn.set::<_, _, ()>(Self::doc_key(&doc.id), payload)
            .await
            .map_err(|e| StoreError::KvCache(e.to_string()))?;
        conn.sadd::<_, _, ()>(INDEX_KEY, &doc.id)
            .await
            .map_err(|e| StoreError::KvCache(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let mut conn = self.pool.get().await.map_err(|e| StoreError::KvCache(e.to_string()))?;
        let payload: Option<String> = conn.get(Self::doc_key(id)).await.map_err(|e| StoreError::KvCache(e.to_string()))?;
        match payload {
            Some(p) => Ok(Some(
                serde_json::from_str(&p).map_err(|e| StoreError::KvCache(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let mut conn = self.pool.get().await.map_err(|e| StoreError::KvCache(e.to_string()))?;
        let ids: Vec<String> = conn.smembers(INDEX_KEY).await.map_err(|e| StoreError::KvCache(e.to_string()))?;
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.get(&id).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn health_check(&self) -> bool {
        let Ok(mut conn) = self.pool.get().await else {
            return false;
        };
        deadpool_redis::redis::cmd("PING").query_async::<String>(&mut conn).await.is_ok()
    }
}

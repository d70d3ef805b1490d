//! Remote managed vector index backend: a thin HTTP client over a hosted
//! similarity-search service. Shaped like a typical vector-DB HTTP API
//! (upsert/query/fetch by namespace) rather than any one vendor's SDK.

use crate::backend::Backend;
use crate::contract::StoredDocument;
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct ManagedIndexBackend {
    base_url: String,
    token: String,
    client: Client,
}

impl ManagedIndexBackend {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with default TLS backend");
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[derive(serde::Serialize)]
struct UpsertRequest<'a> {
    id: &'a str,
    vector: &'a [f32],
    metadata: serde_json::Value,
}

#[derive(serde::Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
}

#[derive(serde::Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(serde::Deserialize)]
struct QueryMatch {
    id: String,
}

#[async_trait]
impl Backend for ManagedIndexBackend {
    fn name(&self) -> &'static str {
        "managed_index"
    }

    async fn put(&self, doc: &StoredDocument) -> Result<(), StoreError> {
        let Some(embedding) = &doc.embedding else {
            return Err(StoreError::ManagedIndex(format!("{} has no embedding to index", doc.id)));
        };
        let request = UpsertRequest {
            id: &doc.id,
            vector: embedding,
            metadata: serde_json::json!({
                "text": doc.text,
                "content_hash": doc.content_hash,
            }),
        };
        self.client
            .post(self.url("upsert"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::ManagedIndex(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::ManagedIndex(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, _id: &str) -> Result<Option<StoredDocument>, StoreError> {
        // The managed index stores vectors + light metadata, not the full
        // document text. Full document retrieval is the document-db tier's
        // job; this backend only contributes to query().
        Ok(None)
    }

    async fn all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.url("health"))
            .timeout(Duration::from_secs(3))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn query_similarity(&self, embedding: Option<&[f32]>, k: usize) -> Option<Vec<String>> {
        let embedding = embedding?;
        let request = QueryRequest { vector: embedding, top_k: k };
        let response = self
            .client
            .post(self.url("query"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?
            .json::<QueryResponse>()
            .await
            .ok()?;
        Some(response.matches.into_iter().map(|m| m.id).collect())
    }
}

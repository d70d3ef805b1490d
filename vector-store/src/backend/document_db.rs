//! Remote document database backend: holds the full document record
//! (text + metadata + content hash) so `GetDocument` and tiered warmup have
//! a durable source even when the managed index only keeps vectors.

use crate::backend::Backend;
use crate::contract::StoredDocument;
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct DocumentDbBackend {
    base_url: String,
    token: String,
    client: Client,
}

impl DocumentDbBackend {
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

#[async_trait]
impl Backend for DocumentDbBackend {
    fn name(&self) -> &'static str {
        "document_db"
    }

    async fn put(&self, doc: &StoredDocument) -> Result<(), StoreError> {
        self.client
            .put(self.url(&format!("documents/{}", doc.id)))
            .bearer_auth(&self.token)
            .json(doc)
            .send()
            .await
            .map_err(|e| StoreError::DocumentDb(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::DocumentDb(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("documents/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::DocumentDb(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status().map_err(|e| StoreError::DocumentDb(e.to_string()))?;
        let doc = response
            .json::<StoredDocument>()
            .await
            .map_err(|e| StoreError::DocumentDb(e.to_string()))?;
        Ok(Some(doc))
    }

    async fn all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let response = self
            .client
            .get(self.url("documents"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::DocumentDb(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::DocumentDb(e.to_string()))?;
        response
            .json::<Vec<StoredDocument>>()
            .await
            .map_err(|e| StoreError::DocumentDb(e.to_string()))
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
}

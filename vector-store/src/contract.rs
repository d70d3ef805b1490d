//! The central interface of the system (§4.3): `Upsert`, `Query`,
//! `GetDocument`, `GetStats`, `HealthCheck`, implemented polymorphically over
//! the four backend variants and composed by [`crate::tiered::TieredStore`].

use async_trait::async_trait;
use cricket_core::DocumentMetadata;
use std::collections::HashMap;

pub type QueryFilters = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: DocumentMetadata,
    pub content_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpsertOutcome {
    pub written: usize,
    pub dedupe_hits: Vec<String>,
    pub errors: Vec<(String, String)>,
}

impl UpsertOutcome {
    pub fn merge(&mut self, other: UpsertOutcome) {
        self.written += other.written;
        self.dedupe_hits.extend(other.dedupe_hits);
        self.errors.extend(other.errors);
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub backends_healthy: usize,
    pub backends_total: usize,
    pub dedupe_hits_total: u64,
    pub query_errors_total: u64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Writes `docs`, skipping any whose content hash already matches what
    /// is stored. Never fails outright: partial failure is reported through
    /// [`UpsertOutcome::errors`], per §4.3 failure semantics.
    async fn upsert(&self, docs: Vec<cricket_core::Document>) -> UpsertOutcome;

    /// Returns at most `k` document ids ordered by similarity, honoring
    /// `filters` as an exact-match AND over metadata applied before ranking.
    /// On total backend failure returns an empty list, never an error.
    async fn query(&self, text: &str, filters: &QueryFilters, k: usize) -> Vec<String>;

    async fn get_document(&self, id: &str) -> Option<StoredDocument>;

    async fn stats(&self) -> StoreStats;

    async fn health_check(&self) -> bool;
}

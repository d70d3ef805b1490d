//! Tiered persistence (§4.3, §9): backends are composed behind one
//! interface and tried in priority order for both reads and writes, with an
//! in-memory map warmed at startup from whichever backend answers first.

use crate::backend::Backend;
use crate::contract::{QueryFilters, StoreStats, StoredDocument, UpsertOutcome, VectorStore};
use crate::embed;
use crate::hash::content_hash;
use crate::lexical;
use async_trait::async_trait;
use cricket_core::Document;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct TieredStore {
    backends: Vec<Arc<dyn Backend>>,
    /// Warmed cache keyed by document id, the "single exclusive lock on the
    /// document-id key" the concurrency model calls for; reads use a
    /// snapshot via the `RwLock` read guard.
    in_memory: RwLock<hashbrown::HashMap<String, StoredDocument>>,
    dedupe_hits_total: AtomicU64,
    query_errors_total: AtomicU64,
}

impl TieredStore {
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Self {
        Self {
            backends,
            in_memory: RwLock::new(hashbrown::HashMap::new()),
            dedupe_hits_total: AtomicU64::new(0),
            query_errors_total: AtomicU64::new(0),
        }
    }

    /// Warms the in-memory map from whichever backend responds first,
    /// tried in declared priority order.
    pub async fn warm_start(&self) {
        for backend in &self.backends {
            match backend.all().await {
                Ok(docs) if !docs.is_empty() => {
                    log::info!("warmed {} documents from backend `{}`", docs.len(), backend.name());
                    let mut guard = self.in_memory.write().await;
                    for doc in docs {
                        guard.insert(doc.id.clone(), doc);
                    }
                    return;
                }
                Ok(_) => continue,
                Err(err) => {
                    log::warn!("backend `{}` failed during warm start: {err}", backend.name());
                    continue;
                }
            }
        }
        log::warn!("no backend produced documents during warm start");
    }

    fn filters_match(metadata: &cricket_core::DocumentMetadata, filters: &QueryFilters) -> bool {
        filters.iter().all(|(key, value)| match key.as_str() {
            "team_id" => metadata.team_id.as_deref() == Some(value.as_str()),
            "season_id" => &metadata.season_id == value,
            "grade_id" => &metadata.grade_id == value,
            "type" => metadata.kind.to_string() == *value,
            "date" => metadata.date.as_deref() == Some(value.as_str()),
            _ => false,
        })
    }
}

#[async_trait]
impl VectorStore for TieredStore {
    async fn upsert(&self, docs: Vec<Document>) -> UpsertOutcome {
        let mut outcome = UpsertOutcome::default();

        for doc in docs {
            let hash = content_hash(&doc.text, &doc.metadata);

            let already_current = self
                .in_memory
                .read()
                .await
                .get(&doc.id)
                .map(|stored| stored.content_hash == hash)
                .unwrap_or(false);

            if already_current {
                outcome.dedupe_hits.push(doc.id.clone());
                self.dedupe_hits_total.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let stored = StoredDocument {
                id: doc.id.clone(),
                text: doc.text.clone(),
                embedding: Some(embed::embed(&doc.text)),
                metadata: doc.metadata.clone(),
                content_hash: hash,
            };

            let mut any_succeeded = false;
            for backend in &self.backends {
                match backend.put(&stored).await {
                    Ok(()) => any_succeeded = true,
                    Err(err) => outcome.errors.push((doc.id.clone(), format!("{}: {err}", backend.name()))),
                }
            }

            if any_succeeded {
                self.in_memory.write().await.insert(doc.id.clone(), stored);
                outcome.written += 1;
            }
        }

        outcome
    }

    async fn query(&self, text: &str, filters: &QueryFilters, k: usize) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let query_embedding = embed::embed(text);

        for backend in &self.backends {
            if let Some(ids) = backend.query_similarity(Some(&query_embedding), k).await {
                let guard = self.in_memory.read().await;
                let filtered: Vec<String> = ids
                    .into_iter()
                    .filter(|id| guard.get(id).map(|d| Self::filters_match(&d.metadata, filters)).unwrap_or(false))
                    .take(k)
                    .collect();
                return filtered;
            }
        }

        let guard = self.in_memory.read().await;
        if guard.is_empty() {
            self.query_errors_total.fetch_add(1, Ordering::Relaxed);
            return Vec::new();
        }

        let mut candidates: Vec<(String, String)> = guard
            .values()
            .filter(|d| Self::filters_match(&d.metadata, filters))
            .map(|d| (d.id.clone(), d.text.clone()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        lexical::top_k(text, &candidates, k)
    }

    async fn get_document(&self, id: &str) -> Option<StoredDocument> {
        if let Some(doc) = self.in_memory.read().await.get(id).cloned() {
            return Some(doc);
        }

        for backend in &self.backends {
            match backend.get(id).await {
                Ok(Some(doc)) => {
                    self.in_memory.write().await.insert(doc.id.clone(), doc.clone());
                    return Some(doc);
                }
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("backend `{}` failed on get_document({id}): {err}", backend.name());
                    continue;
                }
            }
        }
        None
    }

    async fn stats(&self) -> StoreStats {
        let mut healthy = 0;
        for backend in &self.backends {
            if backend.health_check().await {
                healthy += 1;
            }
        }
        StoreStats {
            document_count: self.in_memory.read().await.len(),
            backends_healthy: healthy,
            backends_total: self.backends.len(),
            dedupe_hits_total: self.dedupe_hits_total.load(Ordering::Relaxed),
            query_errors_total: self.query_errors_total.load(Ordering::Relaxed),
        }
    }

    async fn health_check(&self) -> bool {
        if self.backends.is_empty() {
            return false;
        }
        for backend in &self.backends {
            if backend.health_check().await {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cricket_core::{Document, DocumentKind, DocumentMetadata};
    use std::sync::Mutex as StdMutex;

    struct MemoryBackend {
        docs: StdMutex<hashbrown::HashMap<String, StoredDocument>>,
    }

    impl MemoryBackend {
        fn new() -> Self {
            Self {
                docs: StdMutex::new(hashbrown::HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl Backend for MemoryBackend {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn put(&self, doc: &StoredDocument) -> Result<(), crate::error::StoreError> {
            self.docs.lock().unwrap().insert(doc.id.clone(), doc.clone());
            Ok(())
        }

        async fn get(&self, id: &str) -> Result<Option<StoredDocument>, crate::error::StoreError> {
            Ok(self.docs.lock().unwrap().get(id).cloned())
        }

        async fn all(&self) -> Result<Vec<StoredDocument>, crate::error::StoreError> {
            Ok(self.docs.lock().unwrap().values().cloned().collect())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn meta(team_id: &str) -> DocumentMetadata {
        DocumentMetadata {
            team_id: Some(team_id.to_string()),
            season_id: "s1".to_string(),
            grade_id: "g1".to_string(),
            kind: DocumentKind::Ladder,
            date: None,
        }
    }

    #[tokio::test]
    async fn repeated_upsert_of_unchanged_document_dedupes() {
        let store = TieredStore::new(vec![Arc::new(MemoryBackend::new())]);
        let doc = Document::new("ladder_g1", "Ladder: Under-10", meta("t1"));

        let first = store.upsert(vec![doc.clone()]).await;
        assert_eq!(first.written, 1);
        assert!(first.dedupe_hits.is_empty());

        let second = store.upsert(vec![doc]).await;
        assert_eq!(second.written, 0);
        assert_eq!(second.dedupe_hits, vec!["ladder_g1".to_string()]);
    }

    #[tokio::test]
    async fn query_excludes_documents_failing_the_filter() {
        let store = TieredStore::new(vec![Arc::new(MemoryBackend::new())]);
        store
            .upsert(vec![
                Document::new("ladder_g1", "Ladder: Under-10 blue team", meta("t1")),
                Document::new("ladder_g2", "Ladder: Under-10 blue team", meta("t2")),
            ])
            .await;

        let mut filters = QueryFilters::new();
        filters.insert("team_id".to_string(), "t1".to_string());

        let results = store.query("ladder blue team", &filters, 5).await;
        assert_eq!(results, vec!["ladder_g1".to_string()]);
    }

    #[tokio::test]
    async fn get_document_round_trips_after_upsert() {
        let store = TieredStore::new(vec![Arc::new(MemoryBackend::new())]);
        let doc = Document::new("roster_t1", "Roster: Caroline Springs Blue U10", meta("t1"));
        store.upsert(vec![doc.clone()]).await;

        let fetched = store.get_document("roster_t1").await.unwrap();
        assert_eq!(fetched.text, doc.text);
    }
}

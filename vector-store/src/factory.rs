//! Builds the tiered backend list from configuration (§4.3). Any subset of
//! the four variants may be configured; local file is always included since
//! it needs no external endpoint and is the durable floor.

use crate::backend::document_db::DocumentDbBackend;
use crate::backend::kv_cache::KvCacheBackend;
use crate::backend::local_file::LocalFileBackend;
use crate::backend::managed_index::ManagedIndexBackend;
use crate::backend::Backend;
use cricket_core::config::Settings;
use std::sync::Arc;

/// Priority order: managed index (semantic search) first, then the document
/// database (full record retrieval), then the cache, with local file last as
/// the always-present fallback.
pub fn build_backends(settings: &Settings) -> Vec<Arc<dyn Backend>> {
    let mut backends: Vec<Arc<dyn Backend>> = Vec::new();

    if let (Some(url), Some(token)) = (&settings.managed_index_url, &settings.managed_index_token) {
        backends.push(Arc::new(ManagedIndexBackend::new(url.clone(), token.clone())));
    } else {
        log::info!("managed_index backend not configured, skipping");
    }

    if let (Some(url), Some(token)) = (&settings.document_db_url, &settings.document_db_token) {
        backends.push(Arc::new(DocumentDbBackend::new(url.clone(), token.clone())));
    } else {
        log::info!("document_db backend not configured, skipping");
    }

    if let Some(redis_url) = &settings.kv_cache_redis_url {
        match KvCacheBackend::new(redis_url.clone()) {
            Ok(backend) => backends.push(Arc::new(backend)),
            Err(err) => log::warn!("failed to build kv_cache backend: {err}"),
        }
    } else {
        log::info!("kv_cache backend not configured, skipping");
    }

    match LocalFileBackend::open(&settings.local_file_path) {
        Ok(backend) => backends.push(Arc::new(backend)),
        Err(err) => log::warn!("failed to open local_file backend at {}: {err}", settings.local_file_path),
    }

    backends
}

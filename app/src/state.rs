//! The constructed dependency graph (§9 REDESIGN FLAGS): every collaborator
//! the router and handlers need, built once at startup in
//! [`crate::main`] and passed explicitly rather than reached for through a
//! process-wide singleton.

use crate::cache::ResponseCache;
use crate::llm::LlmAdapter;
use cricket_core::config::Settings;
use playhq_client::PlayHqClient;
use std::sync::Arc;
use sync_engine::SyncEngine;
use vector_store::VectorStore;

pub struct AppState {
    pub store: Arc<dyn VectorStore>,
    pub client: PlayHqClient,
    pub settings: Arc<Settings>,
    pub cache: ResponseCache,
    pub llm: Arc<dyn LlmAdapter>,
    /// Shared with `cricket-sync`: `/internal/refresh` and `/sync` dispatch
    /// into the same engine rather than reimplementing refresh logic here.
    pub sync: SyncEngine,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Resolves a canonical team name back to its configured PlayHQ team id,
    /// if the identifier bundle knows it.
    pub fn team_id_for(&self, canonical_name: &str) -> Option<String> {
        self.settings
            .ids_bundle
            .as_ref()?
            .teams
            .iter()
            .find(|t| t.name == canonical_name)
            .map(|t| t.team_id.clone())
    }
}

//! Sync engine orchestration (§4.4): full, per-team, per-match and
//! per-ladder refresh, each producing a folded [`SyncStats`].

use crate::config::SyncConfig;
use crate::object_storage::ObjectStore;
use crate::outcome::EntityOutcome;
use crate::stats::AtomicSyncStats;
use crate::stats::SyncStats;
use chrono::Utc;
use cricket_core::config::Settings;
use cricket_core::normalize::{chunk_snippet, Normalizable};
use cricket_core::{Document, DocumentMetadata, Fixture, Ladder, Roster, Scorecard, Team};
use log::{error, info, warn};
use playhq_client::PlayHqClient;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use vector_store::VectorStore;

pub struct SyncEngine {
    pub client: PlayHqClient,
    pub store: Arc<dyn VectorStore>,
    pub object_store: Arc<dyn ObjectStore>,
    pub settings: Arc<Settings>,
    pub config: SyncConfig,
}

impl SyncEngine {
    /// teams → fixtures → ladders → recent scorecards → rosters. Order
    /// matters: later stages assume the fixtures already refreshed into the
    /// store are queryable (§4.4).
    pub async fn full_refresh(&self) -> SyncStats {
        let stats = Arc::new(AtomicSyncStats::default());
        let Some(bundle) = self.settings.ids_bundle.clone() else {
            error!("full refresh requested with no ids_bundle configured");
            stats.errors.fetch_add(1, Ordering::Relaxed);
            return stats.snapshot();
        };

        let team_ids: Vec<String> = bundle.teams.iter().map(|t| t.team_id.clone()).collect();
        self.refresh_teams(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;
        self.refresh_fixtures_for_teams(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;
        self.refresh_ladder(&bundle.grade_id, &bundle.season_id, &stats).await;
        self.refresh_recent_scorecards(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;
        self.refresh_rosters(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;

        stats.snapshot()
    }

    /// Teams, fixtures, roster and recent scorecards for one team.
    pub async fn team_refresh(&self, team_id: &str) -> SyncStats {
        let stats = Arc::new(AtomicSyncStats::default());
        let Some(bundle) = self.settings.ids_bundle.clone() else {
            stats.errors.fetch_add(1, Ordering::Relaxed);
            return stats.snapshot();
        };
        let team_ids = vec![team_id.to_string()];

        self.refresh_teams(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;
        self.refresh_fixtures_for_teams(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;
        self.refresh_recent_scorecards(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;
        self.refresh_rosters(&team_ids, &bundle.season_id, &bundle.grade_id, &stats).await;

        stats.snapshot()
    }

    /// One scorecard, also mirrored to object storage.
    pub async fn match_refresh(&self, match_id: &str) -> SyncStats {
        let stats = Arc::new(AtomicSyncStats::default());
        let (season_id, grade_id) = self
            .settings
            .ids_bundle
            .as_ref()
            .map(|b| (b.season_id.clone(), b.grade_id.clone()))
            .unwrap_or_default();
        ingest_one_scorecard(&self.client, &self.store, &self.object_store, match_id, None, &season_id, &grade_id, &stats).await;
        stats.snapshot()
    }

    /// One grade's ladder, also mirrored to object storage.
    pub async fn ladder_refresh(&self) -> SyncStats {
        let stats = Arc::new(AtomicSyncStats::default());
        let Some(bundle) = &self.settings.ids_bundle else {
            stats.errors.fetch_add(1, Ordering::Relaxed);
            return stats.snapshot();
        };
        self.refresh_ladder(&bundle.grade_id, &bundle.season_id, &stats).await;
        stats.snapshot()
    }

    async fn refresh_teams(&self, team_ids: &[String], season_id: &str, grade_id: &str, stats: &Arc<AtomicSyncStats>) {
        let wanted: std::collections::HashSet<&str> = team_ids.iter().map(String::as_str).collect();
        match self.client.list_teams(grade_id).await {
            Ok(raws) => {
                let matching: Vec<serde_json::Value> = raws
                    .into_iter()
                    .filter(|raw| raw.get("id").and_then(|v| v.as_str()).is_some_and(|id| wanted.contains(id)))
                    .collect();
                let season_id = season_id.to_string();
                let grade_id = grade_id.to_string();
                self.fan_out(&matching, stats, move |_client, store, _object_store, stats, raw| {
                    let season_id = season_id.clone();
                    let grade_id = grade_id.clone();
                    async move {
                        let team_id = raw.get("id").and_then(|v| v.as_str()).map(str::to_string);
                        let outcome = ingest_entity::<Team>(&store, &raw, team_id.as_deref(), &season_id, &grade_id, None, &stats).await;
                        if !outcome.is_error() {
                            stats.teams_updated.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
                .await;
            }
            Err(err) => {
                warn!("team listing failed for grade {grade_id}: {err}");
                stats.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn refresh_fixtures_for_teams(&self, team_ids: &[String], season_id: &str, grade_id: &str, stats: &Arc<AtomicSyncStats>) {
        let season_id = season_id.to_string();
        let grade_id = grade_id.to_string();
        self.fan_out(team_ids, stats, move |client, store, _object_store, stats, team_id| {
            let season_id = season_id.clone();
            let grade_id = grade_id.clone();
            async move {
                use futures::StreamExt;
                let mut fixtures = client.fixtures_for_team(&team_id, &season_id);
                while let Some(raw) = fixtures.next().await {
                    match raw {
                        Ok(raw) => {
                            let outcome = ingest_entity::<Fixture>(&store, &raw, Some(&team_id), &season_id, &grade_id, None, &stats).await;
                            if !outcome.is_error() {
                                stats.fixtures_updated.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        Err(err) => {
                            warn!("fixture fetch failed for team {team_id}: {err}");
                            stats.errors.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }
        })
        .await;
    }

    async fn refresh_ladder(&self, grade_id: &str, season_id: &str, stats: &Arc<AtomicSyncStats>) {
        match self.client.fetch_ladder(grade_id).await {
            Ok(raw) => {
                let outcome = ingest_entity::<Ladder>(&self.store, &raw, None, season_id, grade_id, None, stats).await;
                if !outcome.is_error() {
                    stats.ladders_updated.fetch_add(1, Ordering::Relaxed);
                }
                mirror_ladder(&self.object_store, grade_id, &raw, stats).await;
            }
            Err(err) => {
                warn!("ladder refresh failed for grade {grade_id}: {err}");
                stats.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    async fn refresh_recent_scorecards(&self, team_ids: &[String], season_id: &str, grade_id: &str, stats: &Arc<AtomicSyncStats>) {
        // A real deployment would ask the provider for each team's N most
        // recent completed fixtures directly; here we read the fixtures
        // already refreshed into the store and pull their match ids back out.
        let limit = self.config.recent_completed_limit;
        let season_id = season_id.to_string();
        let grade_id = grade_id.to_string();
        self.fan_out(team_ids, stats, move |client, store, object_store, stats, team_id| {
            let season_id = season_id.clone();
            let grade_id = grade_id.clone();
            async move {
                let mut filters = HashMap::new();
                filters.insert("team_id".to_string(), team_id.clone());
                filters.insert("type".to_string(), "fixture".to_string());
                let ids = store.query("completed", &filters, limit).await;
                for id in ids {
                    let Some(doc) = store.get_document(&id).await else { continue };
                    if !doc.text.contains("Status: completed") {
                        continue;
                    }
                    let match_id = id.trim_start_matches("fixture_").to_string();
                    ingest_one_scorecard(&client, &store, &object_store, &match_id, Some(team_id.clone()), &season_id, &grade_id, &stats).await;
                }
            }
        })
        .await;
    }

    async fn refresh_rosters(&self, team_ids: &[String], season_id: &str, grade_id: &str, stats: &Arc<AtomicSyncStats>) {
        let season_id = season_id.to_string();
        let grade_id = grade_id.to_string();
        self.fan_out(team_ids, stats, move |client, store, _object_store, stats, team_id| {
            let season_id = season_id.clone();
            let grade_id = grade_id.clone();
            async move {
                match client.fetch_roster(&team_id).await {
                    Ok(raw) => {
                        let outcome = ingest_entity::<Roster>(&store, &raw, Some(&team_id), &season_id, &grade_id, None, &stats).await;
                        if !outcome.is_error() {
                            stats.rosters_updated.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(err) => {
                        warn!("roster refresh failed for team {team_id}: {err}");
                        stats.errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        })
        .await;
    }

    /// Runs `work` over `items` with a bounded fan-out (§4.4, §5): an error
    /// on one item never aborts the scope, it only increments the error
    /// counter inside `work` itself. Generic over the item type so every
    /// refresh stage (raw JSON team values, team ids, ...) can share one
    /// concurrency model instead of only the stages that happen to fan out
    /// over `String`.
    async fn fan_out<I, F, Fut>(&self, items: &[I], stats: &Arc<AtomicSyncStats>, work: F)
    where
        I: Clone + Send + Sync + 'static,
        F: Fn(PlayHqClient, Arc<dyn VectorStore>, Arc<dyn ObjectStore>, Arc<AtomicSyncStats>, I) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let fan_out = self.config.fan_out.get();
        let work = Arc::new(work);
        for chunk in items.chunks(fan_out.max(1)) {
            let mut handles = Vec::with_capacity(chunk.len());
            for item in chunk {
                let client = self.client.clone();
                let store = self.store.clone();
                let object_store = self.object_store.clone();
                let stats = stats.clone();
                let item = item.clone();
                let work = work.clone();
                handles.push(tokio::spawn(async move { work(client, store, object_store, stats, item).await }));
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    error!("sync worker task panicked: {err}");
                    stats.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

/// Fetches and ingests one scorecard, mirroring the raw payload to object
/// storage (§4.4, §9). A free function rather than a `&self` method so
/// fan-out closures (which can't capture `self`) can still reach it.
async fn ingest_one_scorecard(
    client: &PlayHqClient,
    store: &Arc<dyn VectorStore>,
    object_store: &Arc<dyn ObjectStore>,
    match_id: &str,
    team_slug_hint: Option<String>,
    season_id: &str,
    grade_id: &str,
    stats: &Arc<AtomicSyncStats>,
) {
    match client.fetch_game_summary(match_id).await {
        Ok(raw) => {
            let is_completed = raw.get("status").and_then(|v| v.as_str()) == Some("completed");
            if !is_completed {
                info!("scorecard for match {match_id} is not completed, skipping");
                return;
            }
            let outcome = ingest_entity::<Scorecard>(store, &raw, None, season_id, grade_id, None, stats).await;
            if !outcome.is_error() {
                stats.scorecards_updated.fetch_add(1, Ordering::Relaxed);
            }
            mirror_match(object_store, match_id, team_slug_hint, &raw, stats).await;
        }
        Err(err) => {
            warn!("scorecard refresh failed for match {match_id}: {err}");
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

async fn mirror_match(object_store: &Arc<dyn ObjectStore>, match_id: &str, team_slug_hint: Option<String>, raw: &serde_json::Value, stats: &Arc<AtomicSyncStats>) {
    let team_slug = team_slug_hint.unwrap_or_else(|| "unknown-team".to_string());
    let date = Utc::now().date_naive();
    let path = crate::object_storage::match_path(&team_slug, date, match_id);
    let pretty = serde_json::to_vec_pretty(raw).unwrap_or_default();
    match object_store.write(&path, &pretty).await {
        Ok(_location) => {
            stats.gcs_writes.fetch_add(1, Ordering::Relaxed);
        }
        Err(err) => {
            error!("failed to mirror match {match_id} to object storage: {err}");
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

async fn mirror_ladder(object_store: &Arc<dyn ObjectStore>, grade_id: &str, raw: &serde_json::Value, stats: &Arc<AtomicSyncStats>) {
    let date = Utc::now().date_naive();
    let path = crate::object_storage::ladder_path(date, grade_id);
    let pretty = serde_json::to_vec_pretty(raw).unwrap_or_default();
    match object_store.write(&path, &pretty).await {
        Ok(_location) => {
            stats.gcs_writes.fetch_add(1, Ordering::Relaxed);
        }
        Err(err) => {
            error!("failed to mirror ladder {grade_id} to object storage: {err}");
            stats.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Normalizes, snippets, chunks, stamps metadata and upserts one entity,
/// folding the outcome into `stats` as a best-effort, never-aborting step.
/// The returned [`EntityOutcome`] is what call sites use to decide whether
/// their own per-entity-type counter (`teams_updated`, `fixtures_updated`,
/// ...) should advance — it must not advance on a failed normalize or a
/// fully-failed upsert, only on `Ok` or `Skipped` (dedupe).
async fn ingest_entity<T: Normalizable>(
    store: &Arc<dyn VectorStore>,
    raw: &serde_json::Value,
    team_id: Option<&str>,
    season_id: &str,
    grade_id: &str,
    date: Option<String>,
    stats: &Arc<AtomicSyncStats>,
) -> EntityOutcome<()> {
    let entity = match T::normalize(raw) {
        Ok(entity) => entity,
        Err(err) => {
            warn!("failed to normalize {:?} entity: {err}", T::KIND);
            stats.errors.fetch_add(1, Ordering::Relaxed);
            return EntityOutcome::Error { detail: err.to_string() };
        }
    };

    let metadata = DocumentMetadata {
        team_id: team_id.map(str::to_string),
        season_id: season_id.to_string(),
        grade_id: grade_id.to_string(),
        kind: T::KIND,
        date,
    };

    let id_prefix = Document::id_for(T::KIND, entity.entity_id());
    let snippet = entity.snippet();
    let docs: Vec<Document> = chunk_snippet(&id_prefix, &snippet)
        .into_iter()
        .map(|(id, text)| Document::new(id, text, metadata.clone()))
        .collect();
    let chunk_count = docs.len();

    let outcome = store.upsert(docs).await;
    stats.vector_upserts.fetch_add(outcome.written as u64, Ordering::Relaxed);
    stats.dedupe_hits.fetch_add(outcome.dedupe_hits.len() as u64, Ordering::Relaxed);

    if !outcome.errors.is_empty() {
        stats.errors.fetch_add(outcome.errors.len() as u64, Ordering::Relaxed);
        if outcome.written == 0 {
            return EntityOutcome::Error {
                detail: format!("all {chunk_count} chunk(s) failed to upsert"),
            };
        }
    }

    if outcome.written == 0 && !outcome.dedupe_hits.is_empty() {
        return EntityOutcome::Skipped { reason: "content unchanged".to_string() };
    }

    EntityOutcome::Ok(())
}

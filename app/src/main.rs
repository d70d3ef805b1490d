mod cache;
mod error;
mod intent;
mod llm;
mod router;
mod routes;
mod state;
mod webhook;

use cricket_core::config::Settings;
use cricket_core::secrets::LiteralSecretStore;
use llm::DevEchoAdapter;
use log::info;
use miette::IntoDiagnostic;
use playhq_client::PlayHqClient;
use rocket::{launch, Build, Rocket};
use state::AppState;
use std::sync::Arc;
use sync_engine::config::SyncConfig;
use sync_engine::object_storage::{MirroringObjectStore, ObjectStore, RemoteBucket};
use sync_engine::SyncEngine;
use vector_store::{TieredStore, VectorStore};

async fn build_state() -> miette::Result<AppState> {
    let settings = Settings::load()?.resolve_and_validate(&LiteralSecretStore).into_diagnostic()?;
    let sync_config = SyncConfig::load()?;

    // §4.5: a webhook route mounted with no secret to verify against is a
    // startup failure, not a per-request 500.
    if settings.is_private_mode() && settings.playhq_webhook_secret.is_none() {
        return Err(miette::miette!("private mode requires secret_playhq_webhook_secret to be configured"));
    }

    let tenant = settings.ids_bundle.as_ref().map(|b| b.tenant.clone()).unwrap_or_default();
    let client = PlayHqClient::with_base_url(settings.playhq_base_url.clone(), settings.playhq_api_key.clone().unwrap_or_default(), tenant);

    let backends = vector_store::build_backends(&settings);
    let tiered = TieredStore::new(backends);
    tiered.warm_start().await;
    let store: Arc<dyn VectorStore> = Arc::new(tiered);

    let object_store: Arc<dyn ObjectStore> = Arc::new(MirroringObjectStore::new(Box::new(RemoteBucket::new(sync_config.object_storage_bucket.clone())), sync_config.local_fallback_dir.clone()));
    let settings = Arc::new(settings);

    let sync = SyncEngine {
        client: client.clone(),
        store: store.clone(),
        object_store,
        settings: settings.clone(),
        config: sync_config,
    };

    Ok(AppState {
        store,
        client,
        settings,
        cache: cache::ResponseCache::new(),
        llm: Arc::new(DevEchoAdapter),
        sync,
        started_at: chrono::Utc::now(),
    })
}

#[launch]
async fn rocket() -> Rocket<Build> {
    env_logger::init();
    let state = build_state().await.expect("failed to build application state");
    info!("cricket-app starting in {} mode", if state.settings.is_private_mode() { "private" } else { "public" });
    let mounted = routes::routes(&state.settings);

    rocket::build().manage(state).mount("/", mounted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cricket_core::config::{IdsBundle, TeamInfo};
    use rocket::local::asynchronous::Client;
    use sync_engine::object_storage::LocalFallback;

    async fn test_client() -> Client {
        let mut settings = Settings::default();
        settings.secret_playhq_api_key = Some("dev-key".to_string());
        settings.internal_token = Some("dev-token".to_string());
        settings.ids_bundle = Some(IdsBundle {
            tenant: "cscc".to_string(),
            org_id: "org-1".to_string(),
            season_id: "season-1".to_string(),
            grade_id: "grade-1".to_string(),
            teams: vec![TeamInfo { name: "Caroline Springs Blue U10".to_string(), team_id: "t1".to_string() }],
        });
        static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
        let unique = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        settings.local_file_path = format!("/tmp/cricket-app-test-{}-{unique}", std::process::id());
        let settings = Arc::new(settings);

        let backends = vector_store::build_backends(&settings);
        let store: Arc<dyn VectorStore> = Arc::new(TieredStore::new(backends));
        let client = PlayHqClient::new("dev-key", "cscc");
        let object_store: Arc<dyn ObjectStore> = Arc::new(LocalFallback::new(format!("/tmp/cricket-app-test-objects-{}-{unique}", std::process::id())));
        let sync = SyncEngine {
            client: client.clone(),
            store: store.clone(),
            object_store,
            settings: settings.clone(),
            config: SyncConfig::default(),
        };
        let state = AppState {
            store,
            client,
            settings,
            cache: cache::ResponseCache::new(),
            llm: Arc::new(DevEchoAdapter),
            sync,
            started_at: chrono::Utc::now(),
        };

        let mounted = routes::routes(&state.settings);
        let config = rocket::Config::figment().merge(("port", openport::pick_random_unused_port()));
        let rocket = rocket::custom(config).manage(state).mount("/", mounted);
        Client::tracked(rocket).await.expect("Rocket should ignite for tests")
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let client = test_client().await;
        let response = client.get("/healthz").dispatch().await;
        assert_eq!(response.status(), rocket::http::Status::Ok);
    }

    #[tokio::test]
    async fn internal_refresh_requires_a_bearer_token() {
        let client = test_client().await;
        let response = client.post("/internal/refresh").body(r#"{"scope":"ladder"}"#).dispatch().await;
        assert_eq!(response.status(), rocket::http::Status::Unauthorized);
    }

    #[tokio::test]
    async fn sync_trigger_is_unauthenticated() {
        let client = test_client().await;
        let response = client.post("/sync").dispatch().await;
        assert_eq!(response.status(), rocket::http::Status::Ok);
    }
}

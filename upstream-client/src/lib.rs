mod error;
mod rate_limiter;
mod retry;

pub use error::PlayHqError;
pub use rate_limiter::RateLimiter;

use futures::{Stream, StreamExt, stream};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.playhq.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next_page: Option<String>,
}

/// Typed, rate-aware HTTP client for the upstream provider (§4.1). Every
/// call carries the two configured headers; transient failures are retried
/// with jittered exponential backoff, persistent ones surface as a typed
/// error the caller logs and skips.
#[derive(Clone)]
pub struct PlayHqClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    tenant: String,
    rate_limiter: Arc<RateLimiter>,
}

impl PlayHqClient {
    pub fn new(api_key: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, tenant)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            tenant: tenant.into(),
            rate_limiter: Arc::new(RateLimiter::per_second(10)),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("x-phq-tenant", &self.tenant)
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, PlayHqError> {
        self.rate_limiter.acquire().await;
        retry::with_backoff(|| async {
            let response = self
                .request(reqwest::Method::GET, path)
                .query(query)
                .send()
                .await
                .map_err(PlayHqError::RequestExecute)?;

            retry::classify_status(response).await
        })
        .await
    }

    async fn fetch_all_pages<T: serde::de::DeserializeOwned>(
        &self,
        path: &'static str,
        query: Vec<(&'static str, String)>,
    ) -> Result<Vec<T>, PlayHqError> {
        let mut items = Vec::new();
        let mut next_page: Option<String> = None;

        loop {
            let mut page_query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
            if let Some(token) = &next_page {
                page_query.push(("page", token));
            }

            let raw = self.get_json(path, &page_query).await?;
            let page: Page<T> = serde_json::from_value(raw).map_err(PlayHqError::Deserialize)?;
            let is_last = page.next_page.is_none() || page.items.is_empty();
            items.extend(page.items);

            if is_last {
                break;
            }
            next_page = page.next_page;
            debug!("fetched a page from {path}, continuing to next_page={next_page:?}");
        }

        Ok(items)
    }

    /// Streams pages of a cancellable paginated read, one page at a time,
    /// rather than buffering the whole collection — used by the sync engine
    /// for endpoints whose result sets can be large (fixtures, rosters).
    pub fn fixtures_for_team<'a>(
        &'a self,
        team_id: &str,
        season_id: &str,
    ) -> impl Stream<Item = Result<serde_json::Value, PlayHqError>> + 'a {
        let team_id = team_id.to_string();
        let season_id = season_id.to_string();
        let client = self.clone();

        stream::unfold(Some((client, team_id, season_id, None::<String>)), move |state| async move {
            let (client, team_id, season_id, page_token) = state?;
            let mut query = vec![("team_id", team_id.clone()), ("season_id", season_id.clone())];
            if let Some(token) = &page_token {
                query.push(("page", token.clone()));
            }
            let query_ref: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();

            let raw = match client.get_json("fixtures", &query_ref).await {
                Ok(raw) => raw,
                Err(err) => return Some((Err(err), None)),
            };

            let page: Page<serde_json::Value> = match serde_json::from_value(raw) {
                Ok(p) => p,
                Err(err) => return Some((Err(PlayHqError::Deserialize(err)), None)),
            };

            let next_state = if page.next_page.is_some() && !page.items.is_empty() {
                Some((client, team_id, season_id, page.next_page.clone()))
            } else {
                None
            };

            Some((Ok(serde_json::Value::Array(page.items)), next_state))
        })
        .flat_map(|result| match result {
            Ok(serde_json::Value::Array(items)) => stream::iter(items.into_iter().map(Ok)).left_stream(),
            Ok(other) => stream::once(async { Ok(other) }).right_stream(),
            Err(err) => stream::once(async { Err(err) }).right_stream(),
        })
    }

    pub async fn list_seasons(&self, org_id: &str) -> Result<Vec<Season>, PlayHqError> {
        self.fetch_all_pages("seasons", vec![("org_id", org_id.to_string())]).await
    }

    pub async fn list_grades(&self, season_id: &str) -> Result<Vec<Grade>, PlayHqError> {
        self.fetch_all_pages("grades", vec![("season_id", season_id.to_string())]).await
    }

    pub async fn list_teams(&self, grade_id: &str) -> Result<Vec<serde_json::Value>, PlayHqError> {
        self.fetch_all_pages("teams", vec![("grade_id", grade_id.to_string())]).await
    }

    pub async fn fetch_ladder(&self, grade_id: &str) -> Result<serde_json::Value, PlayHqError> {
        self.get_json(&format!("grades/{grade_id}/ladder"), &[]).await
    }

    pub async fn fetch_game_summary(&self, match_id: &str) -> Result<serde_json::Value, PlayHqError> {
        self.get_json(&format!("games/{match_id}/summary"), &[]).await
    }

    pub async fn fetch_roster(&self, team_id: &str) -> Result<serde_json::Value, PlayHqError> {
        self.get_json(&format!("teams/{team_id}/roster"), &[]).await
    }
}

/// Per-call deadline helper (§5): wraps a future with the configured
/// timeout, mapping elapsed deadlines onto [`PlayHqError::Timeout`].
pub async fn with_deadline<F, T>(duration: Duration, fut: F) -> Result<T, PlayHqError>
where
    F: std::future::Future<Output = Result<T, PlayHqError>>,
{
    tokio::time::timeout(duration, fut).await.map_err(|_| PlayHqError::Timeout)?
}

pub const DEFAULT_UPSTREAM_DEADLINE: Duration = Duration::from_secs(30);

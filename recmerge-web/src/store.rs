//! Transient operation store
//!
//! Each persisted operation is one JSON file named by a random UUID token.
//! `consume` claims the file by renaming it before reading, so an operation
//! can be read at most once even under concurrent requests, and the claimed
//! file is removed whether or not it deserializes.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

const EXTENSION: &str = "json";
const PARTIAL_SUFFIX: &str = "partial";
const CLAIMED_SUFFIX: &str = "claimed";

/// Opaque handle to a persisted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationToken(Uuid);

impl OperationToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token; anything but a UUID is rejected before touching the filesystem
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for OperationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Never persisted, already consumed, or swept
    #[error("Operation {0} not found")]
    NotFound(OperationToken),

    #[error("Operation store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Directory-backed, consume-once operation store
#[derive(Debug, Clone)]
pub struct OperationStore {
    dir: PathBuf,
}

impl OperationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn path_for(&self, token: OperationToken) -> PathBuf {
        self.dir.join(format!("{}.{}", token, EXTENSION))
    }

    /// Serialize `value` under a fresh token
    ///
    /// Written to a `.partial` file first and renamed into place, so a
    /// half-written operation is never visible to `consume`.
    pub async fn persist<T: Serialize>(&self, value: &T) -> Result<OperationToken, StoreError> {
        self.ensure_dir().await?;

        let token = OperationToken::new();
        let bytes = serde_json::to_vec(value)?;
        let final_path = self.path_for(token);
        let partial_path = final_path.with_extension(format!("{}.{}", EXTENSION, PARTIAL_SUFFIX));

        tokio::fs::write(&partial_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial_path, &final_path).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(e.into());
        }

        tracing::debug!(operation = %token, bytes = bytes.len(), "Operation persisted");
        Ok(token)
    }

    /// Read and delete the operation behind `token`
    ///
    /// The file is gone after this call returns, successfully or not.
    pub async fn consume<T: DeserializeOwned>(&self, token: OperationToken) -> Result<T, StoreError> {
        let path = self.path_for(token);
        let claimed = path.with_extension(format!("{}.{}", EXTENSION, CLAIMED_SUFFIX));

        match tokio::fs::rename(&path, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(token))
            }
            Err(e) => return Err(e.into()),
        }

        let read = tokio::fs::read(&claimed).await;
        if let Err(e) = tokio::fs::remove_file(&claimed).await {
            tracing::warn!(operation = %token, error = %e, "Failed to delete consumed operation");
        }
        let bytes = read?;

        tracing::debug!(operation = %token, bytes = bytes.len(), "Operation consumed");
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Delete store entries last modified more than `ttl` ago
    pub async fn sweep_expired(&self, ttl: Duration) -> Result<usize, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let claimed_suffix = format!(".{}", CLAIMED_SUFFIX);
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            // Claimed files belong to an in-flight consume, which deletes them
            if entry.file_name().to_string_lossy().ends_with(&claimed_suffix) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age > ttl && tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Swept expired operations");
        }
        Ok(removed)
    }
}

/// Periodically sweep expired operations until the runtime shuts down
pub fn spawn_sweeper(store: Arc<OperationStore>, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = store.sweep_expired(ttl).await {
                tracing::warn!(error = %e, "Operation sweep failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        lines: Vec<usize>,
    }

    fn payload() -> Payload {
        Payload {
            name: "run".to_string(),
            lines: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_persist_then_consume_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = OperationStore::new(dir.path().join("ops"));

        let token = store.persist(&payload()).await.unwrap();
        let loaded: Payload = store.consume(token).await.unwrap();
        assert_eq!(loaded, payload());

        let again = store.consume::<Payload>(token).await;
        assert!(matches!(again, Err(StoreError::NotFound(t)) if t == token));
    }

    #[tokio::test]
    async fn test_consume_deletes_even_when_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = OperationStore::new(dir.path());

        let token = store.persist(&"not a payload").await.unwrap();
        let result = store.consume::<Payload>(token).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = OperationStore::new(dir.path());
        store.persist(&payload()).await.unwrap();

        assert_eq!(store.sweep_expired(Duration::from_secs(3600)).await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.sweep_expired(Duration::from_millis(1)).await.unwrap(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_leaves_claimed_operations() {
        let dir = tempfile::tempdir().unwrap();
        let store = OperationStore::new(dir.path());
        let token = store.persist(&payload()).await.unwrap();
        let claimed = dir
            .path()
            .join(format!("{}.{}.{}", OperationToken::new(), EXTENSION, CLAIMED_SUFFIX));
        std::fs::write(&claimed, b"{}").unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.sweep_expired(Duration::from_millis(1)).await.unwrap(), 1);
        assert!(claimed.exists());
        assert!(matches!(
            store.consume::<Payload>(token).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = OperationStore::new(dir.path().join("never-created"));
        assert_eq!(store.sweep_expired(Duration::from_secs(1)).await.unwrap(), 0);
    }

    #[test]
    fn test_token_parse() {
        let token = OperationToken::new();
        assert_eq!(OperationToken::parse(&token.to_string()), Some(token));
        assert_eq!(OperationToken::parse("../../etc/passwd"), None);
    }
}

//! Credential storage
//!
//! The credential is shared between the login and refresh flows; the store
//! is last-writer-wins.

use async_trait::async_trait;
use parking_lot::RwLock;
use perch_types::Credential;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SessionError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stored credential, empty when nothing was ever saved
    async fn get(&self) -> Result<Credential, SessionError>;

    async fn set(&self, credential: &Credential) -> Result<(), SessionError>;

    /// Forget both tokens and the identity
    async fn clear(&self) -> Result<(), SessionError> {
        self.set(&Credential::default()).await
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    credential: RwLock<Credential>,
}

impl InMemoryStore {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(credential),
        }
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get(&self) -> Result<Credential, SessionError> {
        Ok(self.credential.read().clone())
    }

    async fn set(&self, credential: &Credential) -> Result<(), SessionError> {
        *self.credential.write() = credential.clone();
        Ok(())
    }
}

/// Credential persisted as JSON with the `twitterId` / `token` / `refreshToken` keys
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn get(&self) -> Result<Credential, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                SessionError::Store(format!("corrupt {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Credential::default()),
            Err(e) => Err(SessionError::Store(format!(
                "read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn set(&self, credential: &Credential) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| SessionError::Store(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SessionError::Store(format!("create {}: {}", parent.display(), e)))?;
        }

        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SessionError::Store(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SessionError::Store(format!("rename {}: {}", tmp.display(), e)))?;

        debug!("Credential saved to {}", self.path.display());
        Ok(())
    }
}

use crate::errors::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "warmup_token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Absolute expiry in milliseconds since the Unix epoch.
    #[serde(rename = "warmup_token_exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<i64>,
}

#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn load(&self) -> Result<StoredSession, StorageError>;
    async fn store(&self, session: &StoredSession) -> Result<(), StorageError>;
    async fn remove(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SessionBackend for FileBackend {
    async fn load(&self) -> Result<StoredSession, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(session) => Ok(session),
                Err(err) => {
                    error!("failed to parse session file: {err}");
                    Ok(StoredSession::default())
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoredSession::default()),
            Err(err) => {
                error!("failed to read session file: {err}");
                Ok(StoredSession::default())
            }
        }
    }

    async fn store(&self, session: &StoredSession) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(session)?;
        let staging = self.staging_path();
        fs::write(&staging, payload).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<StoredSession>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(session),
        }
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn load(&self) -> Result<StoredSession, StorageError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn store(&self, session: &StoredSession) -> Result<(), StorageError> {
        *self.slot.lock().await = session.clone();
        Ok(())
    }

    async fn remove(&self) -> Result<(), StorageError> {
        *self.slot.lock().await = StoredSession::default();
        Ok(())
    }
}

use crate::errors::StorageError;
use crate::storage::{SessionBackend, StoredSession};
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    SignedOut,
    SignedIn,
    /// The token was dropped because it expired or the server rejected it.
    Expired,
}

pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    clock: Arc<dyn Clock + Send + Sync>,
    guard: Mutex<()>,
    status: watch::Sender<SessionStatus>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self::with_clock(backend, Arc::new(DefaultClock))
    }

    pub fn with_clock(backend: Arc<dyn SessionBackend>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let (status, _) = watch::channel(SessionStatus::SignedOut);
        Self {
            backend,
            clock,
            guard: Mutex::new(()),
            status,
        }
    }

    /// Persists `token` with an expiry `lifetime_seconds` from now. Absent or
    /// non-finite lifetimes count as zero, which leaves an already-expired
    /// session behind.
    pub async fn save(
        &self,
        token: &str,
        lifetime_seconds: Option<f64>,
    ) -> Result<DateTime<Utc>, StorageError> {
        let _guard = self.guard.lock().await;
        let now_ms = self.clock.utc().timestamp_millis();
        let expires_at_ms = now_ms.saturating_add(lifetime_millis(lifetime_seconds));
        self.backend
            .store(&StoredSession {
                token: Some(token.to_string()),
                expires_at_ms: Some(expires_at_ms),
            })
            .await?;
        self.publish(SessionStatus::SignedIn);
        Ok(DateTime::from_timestamp_millis(expires_at_ms).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Returns the current token, or `None` when there is no live session.
    ///
    /// Not a pure read: finding an expired session removes it from storage
    /// before `None` is returned.
    pub async fn read(&self) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().await;
        let stored = self.backend.load().await?;
        let (Some(token), Some(expires_at_ms)) = (stored.token, stored.expires_at_ms) else {
            return Ok(None);
        };
        if expires_at_ms <= self.clock.utc().timestamp_millis() {
            self.backend.remove().await?;
            info!("stored session expired; cleared");
            self.publish(SessionStatus::Expired);
            return Ok(None);
        }
        self.publish(SessionStatus::SignedIn);
        Ok(Some(token))
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.guard.lock().await;
        self.backend.remove().await?;
        self.publish(SessionStatus::SignedOut);
        Ok(())
    }

    pub async fn expire(&self) -> Result<(), StorageError> {
        let _guard = self.guard.lock().await;
        self.backend.remove().await?;
        info!("session rejected by server; cleared");
        self.publish(SessionStatus::Expired);
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    fn publish(&self, next: SessionStatus) {
        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

fn lifetime_millis(lifetime_seconds: Option<f64>) -> i64 {
    match lifetime_seconds {
        // Float-to-int casts saturate, so huge lifetimes clamp instead of wrapping.
        Some(seconds) if seconds.is_finite() => (seconds * 1000.0).round() as i64,
        _ => 0,
    }
}

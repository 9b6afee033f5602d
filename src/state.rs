use crate::api::WarmupApi;
use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::errors::ClientError;
use crate::session::SessionStore;
use crate::storage::{FileBackend, SessionBackend};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub api: WarmupApi,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let backend = Arc::new(FileBackend::new(config.session_path.clone()));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(
        config: ClientConfig,
        backend: Arc<dyn SessionBackend>,
    ) -> Result<Self, ClientError> {
        let session = Arc::new(SessionStore::new(backend));
        let dispatcher = Arc::new(Dispatcher::new(&config, session)?);
        Ok(Self {
            config,
            api: WarmupApi::new(dispatcher),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.api.session()
    }
}

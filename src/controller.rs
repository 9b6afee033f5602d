use crate::errors::{ClientError, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error};

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Loaded(T),
    Errored(String),
}

impl<T> ViewState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

pub enum Refresh<T, R> {
    /// Run the loader again and replace the whole value.
    Refetch,
    /// Apply the mutation result locally without a confirming read.
    Patch(Box<dyn FnOnce(&mut T, &R) + Send>),
}

impl<T, R> Refresh<T, R> {
    pub fn patch(apply: impl FnOnce(&mut T, &R) + Send + 'static) -> Self {
        Self::Patch(Box::new(apply))
    }
}

struct Shared<T> {
    state: ViewState<T>,
    notice: Option<Notice>,
    generation: u64,
    retired: bool,
}

pub struct Controller<T> {
    name: &'static str,
    action: &'static str,
    loader: Loader<T>,
    shared: Arc<Mutex<Shared<T>>>,
    pending: Mutex<Vec<AbortHandle>>,
}

impl<T: Send + 'static> Controller<T> {
    pub fn new<F, Fut>(name: &'static str, action: &'static str, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            name,
            action,
            loader: Arc::new(move || loader().boxed()),
            shared: Arc::new(Mutex::new(Shared {
                state: ViewState::Idle,
                notice: None,
                generation: 0,
                retired: false,
            })),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Starts a load in the background. Only the most recent load may apply
    /// its result.
    pub fn refresh(&self) -> LoadHandle {
        let generation = {
            let mut shared = lock(&self.shared);
            if shared.retired {
                return LoadHandle { task: None };
            }
            shared.generation += 1;
            shared.state = ViewState::Loading;
            shared.generation
        };

        let pending_load = (self.loader)();
        let target = Arc::clone(&self.shared);
        let (name, action) = (self.name, self.action);
        let task = tokio::spawn(async move {
            let result = pending_load.await;
            let mut shared = lock(&target);
            if shared.generation != generation {
                debug!(screen = name, "discarding superseded load result");
                return;
            }
            shared.state = match result {
                Ok(value) => ViewState::Loaded(value),
                Err(err) => {
                    error!(screen = name, "failed to {action}: {err}");
                    ViewState::Errored(err.user_message(action))
                }
            };
        });

        let mut pending = lock(&self.pending);
        pending.retain(|handle| !handle.is_finished());
        pending.push(task.abort_handle());
        LoadHandle { task: Some(task) }
    }

    pub async fn load(&self) {
        self.refresh().finished().await;
    }

    /// Submits `op`. On failure the error is logged, kept as a notice and
    /// returned as a user-facing message; the current state is left as is.
    pub async fn mutate<R, Fut>(
        &self,
        action: &str,
        op: Fut,
        refresh: Refresh<T, R>,
    ) -> std::result::Result<R, String>
    where
        Fut: Future<Output = Result<R>>,
    {
        match op.await {
            Ok(value) => {
                match refresh {
                    Refresh::Patch(apply) => {
                        let mut shared = lock(&self.shared);
                        if let ViewState::Loaded(current) = &mut shared.state {
                            apply(current, &value);
                        }
                    }
                    Refresh::Refetch => self.load().await,
                }
                Ok(value)
            }
            Err(err) => Err(self.fail(action, &err)),
        }
    }

    pub fn fail(&self, action: &str, err: &ClientError) -> String {
        error!(screen = self.name, "failed to {action}: {err}");
        let message = err.user_message(action);
        lock(&self.shared).notice = Some(Notice::Error(message.clone()));
        message
    }

    pub fn set_notice(&self, notice: Notice) {
        lock(&self.shared).notice = Some(notice);
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.shared).notice.clone()
    }

    pub fn with_state<O>(&self, read: impl FnOnce(&ViewState<T>) -> O) -> O {
        read(&lock(&self.shared).state)
    }

    /// Aborts outstanding loads; nothing is applied to this controller afterwards.
    pub fn teardown(&self) {
        {
            let mut shared = lock(&self.shared);
            shared.retired = true;
            shared.generation += 1;
        }
        for handle in lock(&self.pending).drain(..) {
            handle.abort();
        }
    }
}

impl<T: Clone + Send + 'static> Controller<T> {
    pub fn state(&self) -> ViewState<T> {
        lock(&self.shared).state.clone()
    }
}

impl<T> Drop for Controller<T> {
    fn drop(&mut self) {
        for handle in lock(&self.pending).drain(..) {
            handle.abort();
        }
    }
}

#[derive(Debug)]
pub struct LoadHandle {
    task: Option<JoinHandle<()>>,
}

impl LoadHandle {
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Waits for the load; `false` when it was cancelled or never started.
    pub async fn finished(self) -> bool {
        let Some(task) = self.task else {
            return false;
        };
        match task.await {
            Ok(()) => true,
            Err(err) if err.is_cancelled() => false,
            Err(err) => {
                error!("load task panicked: {err}");
                false
            }
        }
    }
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

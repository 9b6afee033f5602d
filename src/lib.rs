pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod screens;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;

pub use api::WarmupApi;
pub use config::ClientConfig;
pub use errors::{ClientError, StorageError};
pub use session::{SessionStatus, SessionStore};
pub use state::AppState;

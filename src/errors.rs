use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// A protected route answered 401 to a request that carried no token.
    #[error("{message}")]
    SignedOut { message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::SignedOut { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Short message suitable for showing next to a screen, where `action`
    /// reads like "load users" or "update subscription".
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::Status { status, message } => match *status {
                StatusCode::UNAUTHORIZED => "Session expired, please sign in again".to_string(),
                StatusCode::CONFLICT | StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND
                    if !message.is_empty() =>
                {
                    message.clone()
                }
                _ => generic_failure(action),
            },
            Self::SignedOut { .. } => "Not signed in, please sign in first".to_string(),
            Self::Decode(_) => "Unexpected response from server".to_string(),
            Self::Transport(_) | Self::Storage(_) => generic_failure(action),
        }
    }

    /// Login and register answer bad credentials with 400 or 401.
    pub fn auth_message(&self) -> String {
        match self.status() {
            Some(StatusCode::UNAUTHORIZED) => "Invalid credentials".to_string(),
            Some(StatusCode::BAD_REQUEST) => match self {
                Self::Status { message, .. } if message.contains("already") => message.clone(),
                _ => "Invalid credentials".to_string(),
            },
            _ => self.user_message("sign in"),
        }
    }
}

fn generic_failure(action: &str) -> String {
    format!("Unable to {action}. Please try again later.")
}

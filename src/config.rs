use std::{env, path::PathBuf};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_SESSION_PATH: &str = "data/session.json";

const API_URL_ENV: &str = "WARMUP_API_URL";
const SESSION_PATH_ENV: &str = "WARMUP_SESSION_PATH";
const WITH_CREDENTIALS_ENV: &str = "WARMUP_WITH_CREDENTIALS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub session_path: PathBuf,
    /// Keep and resend cookies for deployments that rely on credentialed requests.
    pub with_credentials: bool,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(API_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let session_path = lookup(SESSION_PATH_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));
        let with_credentials = lookup(WITH_CREDENTIALS_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Self {
            base_url: normalize_base_url(&base_url),
            session_path,
            with_credentials,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

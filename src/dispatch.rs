use crate::config::{ClientConfig, normalize_base_url};
use crate::errors::{ClientError, Result};
use crate::session::SessionStore;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub payload: Payload,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: Vec::new(),
            payload: Payload::Empty,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.payload = Payload::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.payload = Payload::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

impl Body {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            Self::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

pub struct Dispatcher {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self> {
        let http = Client::builder()
            .cookie_store(config.with_credentials)
            .build()?;
        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Only a 401 to the token this call injected from the session store
    /// expires that session.
    pub async fn send(&self, path: &str, options: RequestOptions) -> Result<Body> {
        let url = self.url(path);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MIME));
        if !matches!(options.payload, Payload::Form(_)) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME));
        }
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        let mut sent_token = false;
        if !headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.session.read().await? {
                match HeaderValue::from_str(&format!("Bearer {token}")) {
                    Ok(value) => {
                        headers.insert(AUTHORIZATION, value);
                        sent_token = true;
                    }
                    Err(err) => warn!("stored token is not a valid header value: {err}"),
                }
            }
        }
        let anonymous = !headers.contains_key(AUTHORIZATION);

        debug!(method = %options.method, %url, "dispatching request");
        let mut request = self.http.request(options.method, &url).headers(headers);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        request = match options.payload {
            Payload::Empty => request,
            Payload::Json(value) => request.body(serde_json::to_vec(&value)?),
            Payload::Form(fields) => request.form(&fields),
        };

        let response = request.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(JSON_MIME));
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, is_json, &text);
            warn!(%status, path, "request failed: {message}");
            if status == StatusCode::UNAUTHORIZED && !is_auth_path(path) {
                if sent_token {
                    if let Err(err) = self.session.expire().await {
                        warn!("failed to clear rejected session: {err}");
                    }
                } else if anonymous {
                    return Err(ClientError::SignedOut { message });
                }
            }
            return Err(ClientError::Status { status, message });
        }

        parse_body(is_json, text)
    }
}

fn parse_body(is_json: bool, text: String) -> Result<Body> {
    if !is_json {
        return Ok(Body::Text(text));
    }
    if text.trim().is_empty() {
        return Ok(Body::Json(Value::Null));
    }
    Ok(Body::Json(serde_json::from_str(&text)?))
}

/// Prefers a JSON `detail` string, then the raw body, then the status line.
pub fn error_message(status: StatusCode, is_json: bool, text: &str) -> String {
    if is_json {
        let detail = serde_json::from_str::<Value>(text).ok().and_then(|value| {
            value
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        if let Some(detail) = detail.filter(|detail| !detail.trim().is_empty()) {
            return detail;
        }
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status.to_string()
}

fn is_auth_path(path: &str) -> bool {
    path.trim_start_matches('/').starts_with("auth/")
}

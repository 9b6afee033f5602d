use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds; absent or non-numeric values expire the token at once.
    #[serde(default)]
    pub expires_in: Option<f64>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub price_monthly: f64,
    #[serde(default)]
    pub limits_json: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub status: String,
    pub plan: Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub used_api_calls: u64,
    pub limit_api_calls: u64,
    pub remaining_api_calls: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub active_users: u64,
    pub recent_signups: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_users: u64,
    pub total_api_calls: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub label: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct NewAccount<'a> {
    pub label: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub account_id: i64,
    pub kind: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct NewTask<'a> {
    pub account_id: i64,
    pub kind: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamSummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub latest_score: Option<f64>,
    #[serde(default)]
    pub last_checked_at: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCheck {
    pub domain: String,
    #[serde(default)]
    pub mx_records: Vec<String>,
    #[serde(default)]
    pub blacklist_hits: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub checked_at: Option<String>,
    pub spam: SpamSummary,
}

fn default_true() -> bool {
    true
}

fn default_token_type() -> String {
    "bearer".to_string()
}

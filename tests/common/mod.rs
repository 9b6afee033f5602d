#![allow(dead_code)]

use axum::extract::{Form, Json, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;

pub const TOKEN: &str = "abc";
pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "secret";

/// Serialises tests that share the stub backend.
pub static TEST_LOCK: Lazy<AsyncMutex<()>> = Lazy::new(|| AsyncMutex::new(()));
pub static BACKEND: Lazy<StubBackend> = Lazy::new(StubBackend::start);

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
}

#[derive(Debug)]
pub struct StubState {
    pub requests: Vec<SeenRequest>,
    pub login_forms: Vec<HashMap<String, String>>,
    pub users: Vec<Value>,
    pub accounts: Vec<Value>,
    pub tasks: Vec<Value>,
    pub subscription: Option<String>,
    pub fail_accounts: bool,
    next_id: i64,
}

impl StubState {
    fn seeded() -> Self {
        Self {
            requests: Vec::new(),
            login_forms: Vec::new(),
            users: vec![
                user(5, "Ada", EMAIL, true, true),
                user(7, "Grace", "grace@example.com", true, false),
                user(9, "Linus", "linus@example.com", false, false),
            ],
            accounts: vec![json!({"id": 1, "label": "sales@acme.test", "status": "warming"})],
            tasks: vec![json!({"id": 1, "account_id": 1, "kind": "email", "state": "queued"})],
            subscription: None,
            fail_accounts: false,
            next_id: 100,
        }
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<SeenRequest> {
        self.requests
            .iter()
            .filter(|seen| seen.method == method && seen.path == path)
            .cloned()
            .collect()
    }
}

fn user(id: i64, name: &str, email: &str, active: bool, admin: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "is_active": active,
        "is_admin": admin,
        "created_at": "2026-01-05T09:00:00",
    })
}

fn plans() -> Value {
    json!([
        {"id": 1, "slug": "free", "name": "Free", "price_monthly": 0.0, "limits_json": {"max_api_calls": 1000}},
        {"id": 2, "slug": "pro", "name": "Pro", "price_monthly": 29.0, "limits_json": {"max_api_calls": 10000}},
    ])
}

#[derive(Clone)]
struct Stub(Arc<Mutex<StubState>>);

impl Stub {
    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.0.lock().unwrap()
    }
}

pub struct StubBackend {
    pub base_url: String,
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    fn start() -> Self {
        let state = Arc::new(Mutex::new(StubState::seeded()));
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind stub backend");
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Stub(Arc::clone(&state)));

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("stub runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn reset(&self) {
        *self.state() = StubState::seeded();
    }

    pub fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap()
    }
}

fn router(stub: Stub) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/broken", get(broken))
        .route("/api/teapot", get(teapot))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", axum::routing::delete(delete_user))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/users/:id/activate", post(activate))
        .route("/api/admin/users/:id/deactivate", post(deactivate))
        .route("/api/subscriptions/plans", get(list_plans))
        .route("/api/subscriptions/me", get(my_subscription))
        .route("/api/subscriptions/checkout", post(checkout))
        .route("/api/subscriptions/usage", get(usage))
        .route("/api/analytics/summary", get(analytics))
        .route("/api/v1/check/domain", get(check_domain))
        .route("/api/cookies/set", get(set_cookie))
        .route("/api/cookies/echo", get(echo_cookie))
        .route("/api/accounts", get(list_accounts).post(create_account))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .layer(middleware::from_fn_with_state(stub.clone(), record))
        .with_state(stub)
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn record(State(stub): State<Stub>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    let seen = SeenRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: header_text(headers, header::AUTHORIZATION),
        content_type: header_text(headers, header::CONTENT_TYPE),
        accept: header_text(headers, header::ACCEPT),
    };
    stub.lock().requests.push(seen);
    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> bool {
    header_text(headers, header::AUTHORIZATION).as_deref() == Some(&format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not authenticated"})),
    )
        .into_response()
}

fn token_response(user: Value) -> Response {
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": user,
    }))
    .into_response()
}

async fn health() -> Response {
    Json(json!({"ok": true})).into_response()
}

async fn broken() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

async fn teapot() -> Response {
    (StatusCode::IM_A_TEAPOT, "short and stout").into_response()
}

async fn login(State(stub): State<Stub>, Form(form): Form<HashMap<String, String>>) -> Response {
    let accepted = form.get("username").map(String::as_str) == Some(EMAIL)
        && form.get("password").map(String::as_str) == Some(PASSWORD);
    let mut state = stub.lock();
    state.login_forms.push(form);
    if !accepted {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect email or password"})),
        )
            .into_response();
    }
    token_response(state.users[0].clone())
}

async fn register(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    let mut state = stub.lock();
    if state.users.iter().any(|user| user["email"] == body["email"]) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"detail": "Email already exists"})),
        )
            .into_response();
    }
    state.next_id += 1;
    let created = user(
        state.next_id,
        body["name"].as_str().unwrap_or_default(),
        body["email"].as_str().unwrap_or_default(),
        true,
        false,
    );
    state.users.push(created.clone());
    token_response(created)
}

async fn me(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(stub.lock().users[0].clone()).into_response()
}

async fn list_users(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(Value::Array(stub.lock().users.clone())).into_response()
}

async fn create_user(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = stub.lock();
    if state.users.iter().any(|user| user["email"] == body["email"]) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"detail": "Email already exists"})),
        )
            .into_response();
    }
    state.next_id += 1;
    let created = user(
        state.next_id,
        body["name"].as_str().unwrap_or_default(),
        body["email"].as_str().unwrap_or_default(),
        true,
        false,
    );
    state.users.push(created.clone());
    Json(created).into_response()
}

async fn delete_user(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    stub.lock().users.retain(|user| user["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn admin_stats(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = stub.lock();
    let active = state
        .users
        .iter()
        .filter(|user| user["is_active"] == true)
        .count();
    Json(json!({
        "total_users": state.users.len(),
        "active_users": active,
        "recent_signups": 1,
    }))
    .into_response()
}

fn set_active(stub: &Stub, headers: &HeaderMap, id: i64, active: bool) -> Response {
    if !authorized(headers) {
        return unauthorized();
    }
    let mut state = stub.lock();
    match state.users.iter_mut().find(|user| user["id"] == id) {
        Some(user) => {
            user["is_active"] = Value::Bool(active);
            Json(json!({"ok": true})).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "User not found"})),
        )
            .into_response(),
    }
}

async fn activate(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    set_active(&stub, &headers, id, true)
}

async fn deactivate(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    set_active(&stub, &headers, id, false)
}

async fn list_plans() -> Response {
    Json(plans()).into_response()
}

async fn my_subscription(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let slug = stub.lock().subscription.clone();
    let current = slug.and_then(|slug| {
        plans()
            .as_array()
            .and_then(|plans| plans.iter().find(|plan| plan["slug"] == slug.as_str()).cloned())
    });
    match current {
        Some(plan) => Json(json!({"id": 50, "status": "active", "plan": plan})).into_response(),
        None => Json(Value::Null).into_response(),
    }
}

async fn checkout(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let slug = query.get("plan_slug").cloned().unwrap_or_default();
    if slug != "free" && slug != "pro" {
        return Json(json!({"ok": false, "message": "plan not found"})).into_response();
    }
    stub.lock().subscription = Some(slug.clone());
    Json(json!({"ok": true, "message": "subscription activated", "plan": slug})).into_response()
}

async fn usage(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({"used_api_calls": 120, "limit_api_calls": 1000, "remaining_api_calls": 880}))
        .into_response()
}

async fn analytics(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let total_users = stub.lock().users.len();
    Json(json!({"total_users": total_users, "total_api_calls": 4321})).into_response()
}

async fn check_domain(Query(query): Query<HashMap<String, String>>) -> Response {
    let domain = query.get("domain").cloned().unwrap_or_default();
    if domain == "acme.test" {
        return Json(json!({
            "domain": domain,
            "mx_records": ["mx1.acme.test", "mx2.acme.test"],
            "blacklist_hits": ["zen.spamhaus.org"],
            "warnings": ["No SPF record"],
            "checked_at": "2026-01-05T09:00:00",
            "spam": {"count": 2, "average_score": 3.5, "latest_score": 4.0, "last_checked_at": "2026-01-05T08:30:00"},
        }))
        .into_response();
    }
    Json(json!({
        "domain": domain,
        "mx_records": [],
        "blacklist_hits": [],
        "warnings": [],
        "checked_at": "2026-01-05T09:00:00",
        "spam": {"count": 0, "average_score": null, "latest_score": null, "last_checked_at": null},
    }))
    .into_response()
}

async fn set_cookie() -> Response {
    (
        [(header::SET_COOKIE, "sid=xyz; Path=/")],
        Json(json!({"ok": true})),
    )
        .into_response()
}

async fn echo_cookie(headers: HeaderMap) -> Response {
    header_text(&headers, header::COOKIE)
        .unwrap_or_default()
        .into_response()
}

async fn list_accounts(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = stub.lock();
    if state.fail_accounts {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(Value::Array(state.accounts.clone())).into_response()
}

async fn create_account(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = stub.lock();
    state.next_id += 1;
    let account = json!({"id": state.next_id, "label": body["label"], "status": "pending"});
    state.accounts.push(account.clone());
    Json(account).into_response()
}

async fn list_tasks(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(Value::Array(stub.lock().tasks.clone())).into_response()
}

async fn create_task(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = stub.lock();
    state.next_id += 1;
    let task = json!({
        "id": state.next_id,
        "account_id": body["account_id"],
        "kind": body["kind"],
        "state": "queued",
    });
    state.tasks.push(task.clone());
    Json(task).into_response()
}

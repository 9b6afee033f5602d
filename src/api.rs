use crate::dispatch::{Dispatcher, RequestOptions};
use crate::errors::Result;
use crate::models::{
    Account, AdminStats, AnalyticsSummary, AuthResponse, CheckoutOutcome, DomainCheck, Health,
    NewAccount, NewTask, NewUser, Plan, Registration, Subscription, Task, UsageSnapshot, User,
};
use crate::session::SessionStore;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct WarmupApi {
    dispatcher: Arc<Dispatcher>,
}

impl WarmupApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.dispatcher.session()
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.dispatcher.send(path, options).await?.decode()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let options = RequestOptions::post().form(&[("username", email), ("password", password)]);
        let auth: AuthResponse = self.fetch("/auth/login", options).await?;
        self.persist(&auth).await?;
        info!(email, "signed in");
        Ok(auth)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let options = RequestOptions::post().json(&Registration {
            name,
            email,
            password,
        })?;
        let auth: AuthResponse = self.fetch("/auth/register", options).await?;
        self.persist(&auth).await?;
        info!(email, "registered");
        Ok(auth)
    }

    pub async fn logout(&self) -> Result<()> {
        self.session().clear().await?;
        info!("signed out");
        Ok(())
    }

    async fn persist(&self, auth: &AuthResponse) -> Result<()> {
        self.session()
            .save(&auth.access_token, auth.expires_in)
            .await?;
        Ok(())
    }

    pub async fn me(&self) -> Result<User> {
        self.fetch("/auth/me", RequestOptions::get()).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.fetch("/users", RequestOptions::get()).await
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Result<User> {
        let options = RequestOptions::post().json(&NewUser { name, email })?;
        self.fetch("/users", options).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.dispatcher
            .send(&format!("/users/{id}"), RequestOptions::delete())
            .await?;
        Ok(())
    }

    pub async fn admin_users(&self) -> Result<Vec<User>> {
        self.fetch("/admin/users", RequestOptions::get()).await
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        self.fetch("/admin/stats", RequestOptions::get()).await
    }

    pub async fn activate_user(&self, id: i64) -> Result<()> {
        self.dispatcher
            .send(&format!("/admin/users/{id}/activate"), RequestOptions::post())
            .await?;
        Ok(())
    }

    pub async fn deactivate_user(&self, id: i64) -> Result<()> {
        self.dispatcher
            .send(&format!("/admin/users/{id}/deactivate"), RequestOptions::post())
            .await?;
        Ok(())
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>> {
        self.fetch("/subscriptions/plans", RequestOptions::get()).await
    }

    pub async fn current_subscription(&self) -> Result<Option<Subscription>> {
        self.fetch("/subscriptions/me", RequestOptions::get()).await
    }

    pub async fn checkout(&self, plan_slug: &str) -> Result<CheckoutOutcome> {
        let options = RequestOptions::post().query("plan_slug", plan_slug);
        self.fetch("/subscriptions/checkout", options).await
    }

    pub async fn usage(&self) -> Result<UsageSnapshot> {
        self.fetch("/subscriptions/usage", RequestOptions::get()).await
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary> {
        self.fetch("/analytics/summary", RequestOptions::get()).await
    }

    pub async fn health(&self) -> Result<Health> {
        self.fetch("/health", RequestOptions::get()).await
    }

    pub async fn check_domain(&self, domain: &str) -> Result<DomainCheck> {
        let options = RequestOptions::get().query("domain", domain);
        self.fetch("/v1/check/domain", options).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.fetch("/accounts", RequestOptions::get()).await
    }

    pub async fn create_account(&self, label: &str) -> Result<Account> {
        let options = RequestOptions::post().json(&NewAccount { label })?;
        self.fetch("/accounts", options).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.fetch("/tasks", RequestOptions::get()).await
    }

    pub async fn create_task(&self, account_id: i64, kind: &str) -> Result<Task> {
        let options = RequestOptions::post().json(&NewTask { account_id, kind })?;
        self.fetch("/tasks", options).await
    }
}

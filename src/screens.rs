use crate::api::WarmupApi;
use crate::controller::{Controller, Notice, Refresh, ViewState};
use crate::errors::ClientError;
use crate::models::{
    Account, AdminStats, AnalyticsSummary, CheckoutOutcome, DomainCheck, Plan, Subscription, Task,
    UsageSnapshot, User,
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(message.to_string());
    }
    Ok(trimmed)
}

pub struct UsersScreen {
    api: WarmupApi,
    controller: Controller<Vec<User>>,
}

impl UsersScreen {
    pub fn new(api: WarmupApi) -> Self {
        let loader_api = api.clone();
        let controller = Controller::new("users", "load users", move || {
            let api = loader_api.clone();
            async move { api.list_users().await }
        });
        Self { api, controller }
    }

    pub fn controller(&self) -> &Controller<Vec<User>> {
        &self.controller
    }

    pub async fn load(&self) -> ViewState<Vec<User>> {
        self.controller.load().await;
        self.controller.state()
    }

    pub async fn add_user(&self, name: &str, email: &str) -> Result<User, String> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() {
            let message = "Please provide both name and email".to_string();
            self.controller.set_notice(Notice::Error(message.clone()));
            return Err(message);
        }
        let user = self
            .controller
            .mutate(
                "add user",
                self.api.create_user(name, email),
                Refresh::patch(|users: &mut Vec<User>, user: &User| users.push(user.clone())),
            )
            .await?;
        self.controller
            .set_notice(Notice::Success("User added successfully".to_string()));
        Ok(user)
    }

    /// Removes the user locally once the server accepts the delete; no re-read.
    pub async fn delete_user(&self, id: i64) -> Result<(), String> {
        self.controller
            .mutate(
                "delete user",
                self.api.delete_user(id),
                Refresh::patch(move |users: &mut Vec<User>, _: &()| {
                    users.retain(|user| user.id != id)
                }),
            )
            .await?;
        self.controller
            .set_notice(Notice::Success(format!("Deleted user {id}")));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingView {
    pub plans: Vec<Plan>,
    pub current: Option<Subscription>,
}

impl BillingView {
    pub fn is_current(&self, plan: &Plan) -> bool {
        self.current
            .as_ref()
            .is_some_and(|subscription| subscription.plan.id == plan.id)
    }
}

pub struct BillingScreen {
    api: WarmupApi,
    controller: Controller<BillingView>,
}

impl BillingScreen {
    pub fn new(api: WarmupApi) -> Self {
        let loader_api = api.clone();
        let controller = Controller::new("billing", "load billing details", move || {
            let api = loader_api.clone();
            async move {
                let (plans, current) =
                    tokio::try_join!(api.list_plans(), api.current_subscription())?;
                Ok::<_, ClientError>(BillingView { plans, current })
            }
        });
        Self { api, controller }
    }

    pub fn controller(&self) -> &Controller<BillingView> {
        &self.controller
    }

    pub async fn load(&self) -> ViewState<BillingView> {
        self.controller.load().await;
        self.controller.state()
    }

    pub async fn checkout(&self, plan_slug: &str) -> Result<CheckoutOutcome, String> {
        let outcome = self
            .controller
            .mutate(
                "update subscription",
                self.api.checkout(plan_slug),
                Refresh::Refetch,
            )
            .await?;
        if outcome.ok {
            let message = outcome
                .message
                .clone()
                .unwrap_or_else(|| "Subscription updated".to_string());
            self.controller.set_notice(Notice::Success(message));
            Ok(outcome)
        } else {
            let message = outcome
                .message
                .clone()
                .unwrap_or_else(|| "Unable to update subscription".to_string());
            warn!(plan_slug, "checkout rejected: {message}");
            self.controller.set_notice(Notice::Error(message.clone()));
            Err(message)
        }
    }
}

pub struct UsageScreen {
    controller: Controller<UsageSnapshot>,
}

impl UsageScreen {
    pub fn new(api: WarmupApi) -> Self {
        let controller = Controller::new("usage", "load usage metrics", move || {
            let api = api.clone();
            async move { api.usage().await }
        });
        Self { controller }
    }

    pub fn controller(&self) -> &Controller<UsageSnapshot> {
        &self.controller
    }

    pub async fn load(&self) -> ViewState<UsageSnapshot> {
        self.controller.load().await;
        self.controller.state()
    }
}

pub struct AnalyticsScreen {
    controller: Controller<AnalyticsSummary>,
}

impl AnalyticsScreen {
    pub fn new(api: WarmupApi) -> Self {
        let controller = Controller::new("analytics", "load analytics", move || {
            let api = api.clone();
            async move { api.analytics_summary().await }
        });
        Self { controller }
    }

    pub fn controller(&self) -> &Controller<AnalyticsSummary> {
        &self.controller
    }

    pub async fn load(&self) -> ViewState<AnalyticsSummary> {
        self.controller.load().await;
        self.controller.state()
    }
}

pub struct DeliverabilityScreen {
    target: Arc<Mutex<String>>,
    controller: Controller<DomainCheck>,
}

impl DeliverabilityScreen {
    pub fn new(api: WarmupApi) -> Self {
        let target = Arc::new(Mutex::new(String::new()));
        let domain = Arc::clone(&target);
        let controller = Controller::new("deliverability", "check domain", move || {
            let api = api.clone();
            let domain = domain
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            async move { api.check_domain(&domain).await }
        });
        Self { target, controller }
    }

    pub fn controller(&self) -> &Controller<DomainCheck> {
        &self.controller
    }

    pub async fn check(&self, domain: &str) -> Result<ViewState<DomainCheck>, String> {
        let domain = required(domain, "Please enter a domain").inspect_err(|message| {
            self.controller.set_notice(Notice::Error(message.clone()));
        })?;
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = domain.to_string();
        self.controller.load().await;
        Ok(self.controller.state())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminView {
    pub users: Vec<User>,
    pub stats: AdminStats,
}

pub struct AdminScreen {
    api: WarmupApi,
    controller: Controller<AdminView>,
}

impl AdminScreen {
    pub fn new(api: WarmupApi) -> Self {
        let loader_api = api.clone();
        let controller = Controller::new("admin", "load admin data", move || {
            let api = loader_api.clone();
            async move {
                let (users, stats) = tokio::try_join!(api.admin_users(), api.admin_stats())?;
                Ok::<_, ClientError>(AdminView { users, stats })
            }
        });
        Self { api, controller }
    }

    pub fn controller(&self) -> &Controller<AdminView> {
        &self.controller
    }

    pub async fn load(&self) -> ViewState<AdminView> {
        self.controller.load().await;
        self.controller.state()
    }

    pub async fn set_active(&self, user_id: i64, active: bool) -> Result<(), String> {
        let email = self.controller.with_state(|state| {
            state
                .loaded()
                .and_then(|view| view.users.iter().find(|user| user.id == user_id))
                .map(|user| user.email.clone())
        });
        let label = email.unwrap_or_else(|| format!("user {user_id}"));
        let api = &self.api;
        let op = async move {
            if active {
                api.activate_user(user_id).await
            } else {
                api.deactivate_user(user_id).await
            }
        };
        self.controller
            .mutate("update user status", op, Refresh::Refetch)
            .await?;
        let verb = if active { "Reactivated" } else { "Deactivated" };
        self.controller
            .set_notice(Notice::Success(format!("{verb} {label}")));
        Ok(())
    }

    pub async fn toggle(&self, user_id: i64) -> Result<(), String> {
        let active = self.controller.with_state(|state| {
            state
                .loaded()
                .and_then(|view| view.users.iter().find(|user| user.id == user_id))
                .map(|user| user.is_active)
        });
        match active {
            Some(is_active) => self.set_active(user_id, !is_active).await,
            None => {
                let message = format!("User {user_id} is not in the loaded list");
                self.controller.set_notice(Notice::Error(message.clone()));
                Err(message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub users: Vec<User>,
    pub accounts: Vec<Account>,
    pub tasks: Vec<Task>,
}

pub struct WorkspaceScreen {
    api: WarmupApi,
    controller: Controller<Workspace>,
}

impl WorkspaceScreen {
    pub fn new(api: WarmupApi) -> Self {
        let loader_api = api.clone();
        let controller = Controller::new("workspace", "load workspace", move || {
            let api = loader_api.clone();
            async move {
                let (users, accounts, tasks) =
                    tokio::try_join!(api.list_users(), api.list_accounts(), api.list_tasks())?;
                Ok::<_, ClientError>(Workspace {
                    users,
                    accounts,
                    tasks,
                })
            }
        });
        Self { api, controller }
    }

    pub fn controller(&self) -> &Controller<Workspace> {
        &self.controller
    }

    pub async fn load(&self) -> ViewState<Workspace> {
        self.controller.load().await;
        self.controller.state()
    }

    pub async fn add_account(&self, label: &str) -> Result<Account, String> {
        let label = required(label, "Account label is required").inspect_err(|message| {
            self.controller.set_notice(Notice::Error(message.clone()));
        })?;
        let account = self
            .controller
            .mutate(
                "create account",
                self.api.create_account(label),
                Refresh::patch(|view: &mut Workspace, account: &Account| {
                    view.accounts.push(account.clone())
                }),
            )
            .await?;
        self.controller
            .set_notice(Notice::Success(format!("Created account {}", account.label)));
        Ok(account)
    }

    pub async fn add_task(&self, account_id: i64, kind: &str) -> Result<Task, String> {
        let kind = required(kind, "Task kind is required").inspect_err(|message| {
            self.controller.set_notice(Notice::Error(message.clone()));
        })?;
        let task = self
            .controller
            .mutate(
                "create task",
                self.api.create_task(account_id, kind),
                Refresh::patch(|view: &mut Workspace, task: &Task| view.tasks.push(task.clone())),
            )
            .await?;
        self.controller
            .set_notice(Notice::Success(format!("Queued task {}", task.id)));
        Ok(task)
    }
}

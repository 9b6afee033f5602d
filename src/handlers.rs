use crate::controller::{Controller, ViewState};
use crate::screens::{
    AdminScreen, AnalyticsScreen, BillingScreen, DeliverabilityScreen, UsageScreen, UsersScreen,
    WorkspaceScreen,
};
use crate::session::SessionStatus;
use crate::state::AppState;
use crate::ui;
use tracing::error;

const SIGN_IN_AGAIN: &str = "Session expired. Run `warmup login` to sign in again.";
const NOT_SIGNED_IN: &str = "Not signed in. Run `warmup login` to sign in.";

fn finish<T>(
    state: &AppState,
    view: &ViewState<T>,
    render: impl FnOnce(&T) -> String,
) -> Result<String, String> {
    match view {
        ViewState::Loaded(value) => Ok(render(value)),
        ViewState::Errored(message) => Err(with_redirect(state, message)),
        other => Err(ui::render_state(other, |_| String::new())),
    }
}

fn after_mutation<T>(
    controller: &Controller<T>,
    render: impl FnOnce(&T) -> String,
) -> String
where
    T: Send + 'static,
{
    let notice = controller
        .notice()
        .map(|notice| ui::render_notice(&notice))
        .unwrap_or_default();
    let body = controller.with_state(|view| ui::render_state(view, render));
    if body.is_empty() {
        notice
    } else {
        format!("{notice}\n{body}")
    }
}

/// A rejected token sends the user back to login, whichever screen noticed.
fn with_redirect(state: &AppState, message: &str) -> String {
    if state.session().status() == SessionStatus::Expired {
        format!("{message}\n{SIGN_IN_AGAIN}")
    } else {
        message.to_string()
    }
}

pub async fn health(state: &AppState) -> Result<String, String> {
    match state.api.health().await {
        Ok(health) => Ok(ui::render_health(&health)),
        Err(err) => {
            error!("health check failed: {err}");
            Err("API: Offline".to_string())
        }
    }
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<String, String> {
    match state.api.login(email.trim(), password).await {
        Ok(auth) => {
            let who = auth
                .user
                .map(|user| user.email)
                .unwrap_or_else(|| email.trim().to_string());
            Ok(format!("Signed in as {who}"))
        }
        Err(err) => {
            error!("login failed: {err}");
            Err(err.auth_message())
        }
    }
}

pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<String, String> {
    match state.api.register(name.trim(), email.trim(), password).await {
        Ok(auth) => {
            let who = auth
                .user
                .map(|user| user.email)
                .unwrap_or_else(|| email.trim().to_string());
            Ok(format!("Registered and signed in as {who}"))
        }
        Err(err) => {
            error!("registration failed: {err}");
            Err(err.auth_message())
        }
    }
}

pub async fn logout(state: &AppState) -> Result<String, String> {
    state.api.logout().await.map_err(|err| {
        error!("logout failed: {err}");
        err.user_message("sign out")
    })?;
    Ok("Signed out".to_string())
}

pub async fn whoami(state: &AppState) -> Result<String, String> {
    match state.api.me().await {
        Ok(user) => {
            let role = if user.is_admin { " · Admin" } else { "" };
            Ok(format!("Signed in as {}{role}", user.email))
        }
        Err(err) => {
            error!("failed to load current user: {err}");
            if err.is_unauthorized() {
                Err(NOT_SIGNED_IN.to_string())
            } else {
                Err(with_redirect(state, &err.user_message("load your profile")))
            }
        }
    }
}

pub async fn list_users(state: &AppState) -> Result<String, String> {
    let screen = UsersScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, |users| ui::render_users(users))
}

pub async fn add_user(state: &AppState, name: &str, email: &str) -> Result<String, String> {
    let screen = UsersScreen::new(state.api.clone());
    finish(state, &screen.load().await, |_| String::new())?;
    screen
        .add_user(name, email)
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), |users| {
        ui::render_users(users)
    }))
}

pub async fn delete_user(state: &AppState, id: i64) -> Result<String, String> {
    let screen = UsersScreen::new(state.api.clone());
    finish(state, &screen.load().await, |_| String::new())?;
    screen
        .delete_user(id)
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), |users| {
        ui::render_users(users)
    }))
}

pub async fn plans(state: &AppState) -> Result<String, String> {
    let screen = BillingScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, ui::render_billing)
}

pub async fn checkout(state: &AppState, plan_slug: &str) -> Result<String, String> {
    let screen = BillingScreen::new(state.api.clone());
    screen
        .checkout(plan_slug.trim())
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), ui::render_billing))
}

pub async fn usage(state: &AppState) -> Result<String, String> {
    let screen = UsageScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, ui::render_usage)
}

pub async fn analytics(state: &AppState) -> Result<String, String> {
    let screen = AnalyticsScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, ui::render_analytics)
}

pub async fn check_domain(state: &AppState, domain: &str) -> Result<String, String> {
    let screen = DeliverabilityScreen::new(state.api.clone());
    let view = screen.check(domain).await?;
    finish(state, &view, ui::render_domain_check)
}

pub async fn admin_users(state: &AppState) -> Result<String, String> {
    let screen = AdminScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, ui::render_admin)
}

pub async fn admin_stats(state: &AppState) -> Result<String, String> {
    let screen = AdminScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, |admin| {
        format!(
            "Total users: {}\nActive users: {}\nSignups (7 days): {}",
            admin.stats.total_users, admin.stats.active_users, admin.stats.recent_signups
        )
    })
}

pub async fn set_active(state: &AppState, id: i64, active: bool) -> Result<String, String> {
    let screen = AdminScreen::new(state.api.clone());
    finish(state, &screen.load().await, |_| String::new())?;
    screen
        .set_active(id, active)
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), ui::render_admin))
}

pub async fn toggle_user(state: &AppState, id: i64) -> Result<String, String> {
    let screen = AdminScreen::new(state.api.clone());
    finish(state, &screen.load().await, |_| String::new())?;
    screen
        .toggle(id)
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), ui::render_admin))
}

pub async fn workspace(state: &AppState) -> Result<String, String> {
    let screen = WorkspaceScreen::new(state.api.clone());
    let view = screen.load().await;
    finish(state, &view, ui::render_workspace)
}

pub async fn add_account(state: &AppState, label: &str) -> Result<String, String> {
    let screen = WorkspaceScreen::new(state.api.clone());
    finish(state, &screen.load().await, |_| String::new())?;
    screen
        .add_account(label)
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), ui::render_workspace))
}

pub async fn add_task(state: &AppState, account_id: i64, kind: &str) -> Result<String, String> {
    let screen = WorkspaceScreen::new(state.api.clone());
    finish(state, &screen.load().await, |_| String::new())?;
    screen
        .add_task(account_id, kind)
        .await
        .map_err(|message| with_redirect(state, &message))?;
    Ok(after_mutation(screen.controller(), ui::render_workspace))
}

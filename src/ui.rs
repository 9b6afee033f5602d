use crate::controller::{Notice, ViewState};
use crate::models::{AnalyticsSummary, DomainCheck, Health, UsageSnapshot, User};
use crate::screens::{AdminView, BillingView, Workspace};
use std::fmt::Write as _;

pub fn render_state<T>(state: &ViewState<T>, loaded: impl FnOnce(&T) -> String) -> String {
    match state {
        ViewState::Idle => String::new(),
        ViewState::Loading => "Loading...".to_string(),
        ViewState::Loaded(value) => loaded(value),
        ViewState::Errored(message) => format!("error: {message}"),
    }
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(message) => message.clone(),
        Notice::Error(message) => format!("error: {message}"),
    }
}

pub fn render_users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found. Add one above!".to_string();
    }
    let mut out = format!("{:>5}  {:<24}  {:<32}  {}\n", "ID", "NAME", "EMAIL", "STATUS");
    for user in users {
        let _ = writeln!(
            out,
            "{:>5}  {:<24}  {:<32}  {}",
            user.id,
            user.name,
            user.email,
            if user.is_active { "active" } else { "inactive" }
        );
    }
    out
}

pub fn render_billing(view: &BillingView) -> String {
    let mut out = match &view.current {
        Some(subscription) => format!("Current plan: {}\n", subscription.plan.name),
        None => "No active subscription\n".to_string(),
    };
    for plan in &view.plans {
        let marker = if view.is_current(plan) { "*" } else { " " };
        let limits = plan
            .limits_json
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "{marker} {:<12} {:<16} ${:.2}/mo  {limits}",
            plan.slug, plan.name, plan.price_monthly
        );
    }
    out
}

pub fn render_usage(usage: &UsageSnapshot) -> String {
    format!(
        "API calls: {} / {} (remaining {})",
        usage.used_api_calls, usage.limit_api_calls, usage.remaining_api_calls
    )
}

pub fn render_analytics(summary: &AnalyticsSummary) -> String {
    format!(
        "Total users: {}\nTotal API calls: {}",
        summary.total_users, summary.total_api_calls
    )
}

pub fn render_admin(view: &AdminView) -> String {
    let mut out = format!(
        "Total users: {}  Active users: {}  Signups (7 days): {}\n",
        view.stats.total_users, view.stats.active_users, view.stats.recent_signups
    );
    if view.users.is_empty() {
        out.push_str("No users found yet.");
        return out;
    }
    let _ = writeln!(
        out,
        "{:>5}  {:<24}  {:<32}  {:<8}  {:<6}  {}",
        "ID", "NAME", "EMAIL", "STATUS", "ROLE", "JOINED"
    );
    for user in &view.users {
        let joined = user
            .created_at
            .as_deref()
            .and_then(|stamp| stamp.split('T').next())
            .unwrap_or("-");
        let _ = writeln!(
            out,
            "{:>5}  {:<24}  {:<32}  {:<8}  {:<6}  {joined}",
            user.id,
            user.name,
            user.email,
            if user.is_active { "Active" } else { "Inactive" },
            if user.is_admin { "Admin" } else { "Member" },
        );
    }
    out
}

pub fn render_workspace(workspace: &Workspace) -> String {
    let mut out = String::from("Users\n");
    out.push_str(&render_users(&workspace.users));
    out.push_str("\nAccounts\n");
    if workspace.accounts.is_empty() {
        out.push_str("No accounts yet.\n");
    }
    for account in &workspace.accounts {
        let _ = writeln!(out, "{:>5}  {:<32}  {}", account.id, account.label, account.status);
    }
    out.push_str("\nTasks\n");
    if workspace.tasks.is_empty() {
        out.push_str("No tasks yet.\n");
    }
    for task in &workspace.tasks {
        let _ = writeln!(
            out,
            "{:>5}  account {:<5}  {:<8}  {}",
            task.id, task.account_id, task.kind, task.state
        );
    }
    out
}

fn listed(items: &[String], separator: &str, empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(separator)
    }
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |score| format!("{score:.2}"))
}

pub fn render_domain_check(check: &DomainCheck) -> String {
    let last_checked = check
        .spam
        .last_checked_at
        .as_deref()
        .map_or_else(|| "n/a".to_string(), |stamp| stamp.replacen('T', " ", 1));
    let mut out = format!("Domain: {}\n", check.domain);
    let _ = writeln!(out, "MX Records: {}", listed(&check.mx_records, ", ", "None"));
    let _ = writeln!(
        out,
        "Blacklist Hits: {}",
        listed(&check.blacklist_hits, ", ", "None")
    );
    let _ = writeln!(out, "Warnings: {}", listed(&check.warnings, " · ", "Clear"));
    out.push_str("Spam Score Summary\n");
    let _ = writeln!(out, "  Average Score: {}", score(check.spam.average_score));
    let _ = writeln!(out, "  Latest Score: {}", score(check.spam.latest_score));
    let _ = writeln!(out, "  Last Checked: {last_checked}");
    let _ = write!(out, "  Samples stored: {}", check.spam.count);
    out
}

pub fn render_health(health: &Health) -> String {
    if health.ok {
        "API: Online".to_string()
    } else {
        "API: Offline".to_string()
    }
}

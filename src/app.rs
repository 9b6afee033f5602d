use crate::handlers;
use crate::state::AppState;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "warmup", about = "Terminal console for the Warmup SaaS API")]
pub struct Cli {
    /// Overrides WARMUP_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Overrides WARMUP_SESSION_PATH.
    #[arg(long, global = true)]
    pub session_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the API answers.
    Health,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the signed-in user.
    Whoami,
    #[command(subcommand)]
    Users(UsersCommand),
    /// List plans and the current subscription.
    Plans,
    Checkout {
        plan_slug: String,
    },
    Usage,
    Analytics,
    /// Check MX records, blacklists and spam scores for a sending domain.
    Check {
        domain: String,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    Users,
    Stats,
    Activate { id: i64 },
    Deactivate { id: i64 },
    /// Flip a user's active flag.
    Toggle { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    Show,
    AddAccount {
        label: String,
    },
    AddTask {
        #[arg(long)]
        account_id: i64,
        #[arg(long, default_value = "email")]
        kind: String,
    },
}

pub async fn run(state: &AppState, command: Command) -> Result<String, String> {
    match command {
        Command::Health => handlers::health(state).await,
        Command::Login { email, password } => handlers::login(state, &email, &password).await,
        Command::Register {
            name,
            email,
            password,
        } => handlers::register(state, &name, &email, &password).await,
        Command::Logout => handlers::logout(state).await,
        Command::Whoami => handlers::whoami(state).await,
        Command::Users(UsersCommand::List) => handlers::list_users(state).await,
        Command::Users(UsersCommand::Add { name, email }) => {
            handlers::add_user(state, &name, &email).await
        }
        Command::Users(UsersCommand::Delete { id }) => handlers::delete_user(state, id).await,
        Command::Plans => handlers::plans(state).await,
        Command::Checkout { plan_slug } => handlers::checkout(state, &plan_slug).await,
        Command::Usage => handlers::usage(state).await,
        Command::Analytics => handlers::analytics(state).await,
        Command::Check { domain } => handlers::check_domain(state, &domain).await,
        Command::Admin(AdminCommand::Users) => handlers::admin_users(state).await,
        Command::Admin(AdminCommand::Stats) => handlers::admin_stats(state).await,
        Command::Admin(AdminCommand::Activate { id }) => {
            handlers::set_active(state, id, true).await
        }
        Command::Admin(AdminCommand::Deactivate { id }) => {
            handlers::set_active(state, id, false).await
        }
        Command::Admin(AdminCommand::Toggle { id }) => handlers::toggle_user(state, id).await,
        Command::Workspace(WorkspaceCommand::Show) => handlers::workspace(state).await,
        Command::Workspace(WorkspaceCommand::AddAccount { label }) => {
            handlers::add_account(state, &label).await
        }
        Command::Workspace(WorkspaceCommand::AddTask { account_id, kind }) => {
            handlers::add_task(state, account_id, &kind).await
        }
    }
}

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};
use warmup_client::app::{self, Cli};
use warmup_client::{AppState, ClientConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_base_url(api_url);
    }
    if let Some(session_path) = cli.session_path {
        config.session_path = session_path;
    }

    let state = AppState::new(config)?;
    match app::run(&state, cli.command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
    }
}

mod app;

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{prelude::*, EnvFilter};

use aventura_core::{
    config::{self, AppConfig},
    credentials::{CredentialStore, TokenCell},
    HttpExecutor, SessionManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let token = TokenCell::new();
    let credentials = CredentialStore::new(CredentialStore::default_path());
    let api = Arc::new(HttpExecutor::from_config(&config, token.clone())?);
    let session = Arc::new(SessionManager::new(api.clone(), token, credentials));

    if session.hydrate()? {
        // stored token; check it is still good before showing a prompt
        if let Some(user) = session.fetch_profile().await {
            tracing::info!(user = %user.email, "restored stored session");
        }
    }

    let mut app = app::AventuraApp::new(config, api, session);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("aventura.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

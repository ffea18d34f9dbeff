//! mergebot - release-branch pull-request automation for GitHub Apps.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use mergebot_core::{Config, ReleaseProcessor};
use mergebot_github::{AppAuth, CredentialManager};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod signature;
mod webhook;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        app_id = config.app_id,
        owner = %config.owner,
        release_branch = %config.release_branch,
        master_branch = %config.master_branch,
        enterprise = config.enterprise.is_some(),
        repos = ?config.repos.names(),
        "initialized environment"
    );

    let auth = AppAuth::from_pem_file(config.app_id, &config.private_key_path)
        .context("error creating GitHub App identity")?;

    // Startup credential failures terminate the process; there is no
    // degraded-serving mode.
    let manager = match &config.enterprise {
        Some(enterprise) => CredentialManager::enterprise(auth, &enterprise.api_url, &config.owner)
            .await
            .context("error finding organization installation")?,
        None => CredentialManager::new(auth).context("error creating GitHub App client")?,
    };

    if config.webhook_secret.is_none() {
        warn!("WEBHOOK_SECRET not set, signature verification disabled");
    }

    let processor = ReleaseProcessor::new(&config, manager);
    let state = webhook::AppState::new(config.webhook_secret.clone(), processor);

    let app = Router::new()
        .route("/", post(webhook::handle))
        .route("/healthz", get(webhook::healthz))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "ready to handle github events");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server exited")?;

    Ok(())
}

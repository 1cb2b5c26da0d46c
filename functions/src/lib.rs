//! Hosted callable functions.

mod callable;
mod make_admin;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::post;
use memorial_core::AdminGrant;
use memorial_core::TokenKeys;
use memorial_core::config::Config;
use memorial_state::StateRuntime;
use tokio::net::TcpListener;
use tracing::info;
use tracing::warn;

pub use callable::CallableError;

pub const MAKE_ADMIN_PATH: &str = "/makeAdmin";

/// Dependencies shared by every request.
#[derive(Debug, Clone)]
pub struct FunctionsState {
    pub grant: AdminGrant,
    pub keys: TokenKeys,
}

pub fn router(state: Arc<FunctionsState>) -> Router {
    Router::new()
        .route(MAKE_ADMIN_PATH, post(make_admin::handler))
        .with_state(state)
}

/// Opens the stores described by `config` and serves until Ctrl-C.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let keys = TokenKeys::from_secret(config.require_token_secret()?.as_bytes());
    let runtime = StateRuntime::from_config(config);
    let state = Arc::new(FunctionsState {
        grant: runtime.admin_grant(),
        keys,
    });

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(
        addr = %config.listen_addr,
        data_dir = %runtime.data_dir.display(),
        mirror = runtime.mirror.is_some(),
        "memorial functions listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("functions server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

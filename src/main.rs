use anyhow::Result;
use std::io::ErrorKind;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

use services::{
    audit::AuditSink, backend::BackendClient, identity::IdentityService,
    orchestrator::ResourceOrchestrator, usage::UsageAggregator,
};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting swift-gateway with config: {:?}", cfg);

    // --- Shared outbound client ---
    // One connection pool, one deadline, for both the storage backend and
    // the identity service.
    let http = reqwest::Client::builder()
        .timeout(cfg.backend_timeout)
        .build()?;

    // --- Assemble services ---
    let backend = BackendClient::new(http.clone(), &cfg).map_err(anyhow::Error::msg)?;
    let identity = IdentityService::new(http, &cfg).map_err(anyhow::Error::msg)?;
    let audit = AuditSink::spawn();
    let state = AppState {
        usage: UsageAggregator::new(backend.clone()),
        orchestrator: ResourceOrchestrator::new(backend.clone(), audit),
        identity,
        backend,
    };

    // --- Build router ---
    let app = routes::routes::routes(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Gateway listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

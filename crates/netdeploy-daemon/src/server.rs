//! Web server setup and routing

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api;
use crate::config::TlsConfig;
use crate::state::AppState;

/// Base path of the network deployment API
pub const API_BASE: &str = "/api/v1/network-deployment";

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let devices = Router::new()
        .route("/devices", post(api::register_device).get(api::list_devices))
        .route("/devices/tree", get(api::get_tree))
        .route("/devices/tree/{mac_address}", get(api::get_subtree))
        .route("/devices/{mac_address}", get(api::get_device));

    Router::new()
        .nest(API_BASE, devices)
        .route("/health", get(api::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the web server (HTTP or HTTPS depending on config)
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bind = state.config.daemon.bind.clone();
    let tls = state.config.daemon.tls.clone();
    let app = router(state);

    if let Some(tls_config) = &tls {
        run_https(app, &bind, tls_config).await
    } else {
        run_http(app, &bind).await
    }
}

/// Run plain HTTP server
async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run HTTPS server with TLS
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    for (kind, file) in [("certificate", &tls.cert), ("key", &tls.key)] {
        if !Path::new(file).exists() {
            anyhow::bail!("TLS {} file not found: {}", kind, file);
        }
    }
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .context("Failed to load TLS certificate and key")?;

    info!(address = %addr, protocol = "HTTPS", cert = %tls.cert, "Starting web server with TLS");
    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

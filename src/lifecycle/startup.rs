//! Startup orchestration.
//!
//! # Responsibilities
//! - Build both routers from the validated configuration
//! - Load TLS material when serving HTTPS
//! - Bind the redirect listener, then the primary listener
//! - Serve until shutdown or a fatal error
//!
//! # Design Decisions
//! - Any startup error is fatal, the redirect listener included
//! - The redirect listener runs as a detached task; errors after startup are
//!   logged, not propagated

use std::sync::Arc;
use thiserror::Error;

use crate::config::{ConfigError, GatewayConfig};
use crate::http::{GatewayServer, RedirectServer};
use crate::lifecycle::Shutdown;
use crate::net::listener::{bind, ListenerError};
use crate::net::tls::{load_tls_config, TlsError};

/// Errors that abort the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Failed to load TLS material: {0}")]
    Tls(#[from] TlsError),

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start the gateway and block until the primary listener stops.
pub async fn run(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let config = Arc::new(config);
    let invalid = |e| ConfigError::Validation(vec![e]);

    let gateway = GatewayServer::new(config.clone()).map_err(invalid)?;

    let tls = match (&config.cert_path, &config.key_path) {
        (Some(cert), Some(key)) => Some(load_tls_config(cert, key).await?),
        _ => None,
    };

    if config.runs_redirect_listener() {
        let server = RedirectServer::new(&config).map_err(invalid)?;
        let listener = bind(&config.redirect_address()).await?;
        let signal = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = server.run(listener, signal).await {
                tracing::error!(error = %e, "Redirect listener failed");
            }
        });
    }

    let listener = bind(&config.primary_address()).await?;
    match tls {
        Some(tls) => gateway.run_tls(listener, tls, shutdown.subscribe()).await?,
        None => gateway.run(listener, shutdown.subscribe()).await?,
    }

    Ok(())
}

//! pr-gateway
//!
//! ```text
//!                 ┌────────────────────────── GATEWAY ──────────────────────────┐
//!                 │                                                             │
//!  Client ───────▶│ primary listener ─▶ director ─▶ PR-Forwarded-* ─▶ client ───┼──▶ Backend
//!  (http/https)   │  (TLS optional)      (URI → http://backend)       (hyper)   │   (plain HTTP)
//!                 │                                                             │
//!  Client ───────▶│ :80 listener ─┬─ /.well-known/acme-challenge/* ─▶ relay ────┼──▶ Backend
//!  (http)         │               └─ everything else ─▶ 301 https://host/...    │
//!                 └─────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_gateway::config::{load_config, GatewayArgs};
use pr_gateway::lifecycle::{self, signals, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("pr-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(GatewayArgs::parse()).map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::info!(
        bind = %config.primary_address(),
        backend = %config.backend_address,
        secure = config.secure(),
        redirect_listener = config.runs_redirect_listener(),
        trust_header = config.trust_header.as_deref().unwrap_or(""),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    lifecycle::run(config, &shutdown).await.map_err(|e| {
        tracing::error!(error = %e, "Fatal error");
        e
    })?;

    tracing::info!("Shutdown complete");
    Ok(())
}

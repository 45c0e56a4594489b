//! HTTP server setup.
//!
//! # Responsibilities
//! - Serve the primary router over plaintext or TLS
//! - Serve the auxiliary redirect router over plaintext
//! - Stop accepting on the shutdown broadcast
//!
//! # Design Decisions
//! - Listeners are bound by the caller so bind failures surface at startup
//! - Peer addresses are exposed to handlers through `ConnectInfo`

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::validation::ValidationError;
use crate::config::GatewayConfig;
use crate::http::director::ForwardingDirector;
use crate::http::proxy::proxy_router;
use crate::http::redirect::redirect_router;

/// Time given to in-flight TLS connections once shutdown starts.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Primary listener: forwards every request to the backend.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl GatewayServer {
    /// Create the primary server with the given configuration.
    pub fn new(config: Arc<GatewayConfig>) -> Result<Self, ValidationError> {
        let director = ForwardingDirector::new(&config)?;
        let router = proxy_router(director, config.request_timeout());
        Ok(Self { router, config })
    }

    /// Serve plaintext HTTP on `listener` until shutdown.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend_address,
            scheme = self.config.scheme(),
            "Gateway listening"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Serve HTTPS on `listener` until shutdown.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend_address,
            scheme = self.config.scheme(),
            "Gateway listening"
        );

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Auxiliary listener: ACME relay plus redirect to the secure scheme.
pub struct RedirectServer {
    router: Router,
}

impl RedirectServer {
    pub fn new(config: &GatewayConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            router: redirect_router(config)?,
        })
    }

    /// Serve on `listener` until shutdown.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Redirect listener started");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Redirect listener stopped");
        Ok(())
    }
}

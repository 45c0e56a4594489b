//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to the configured primary and auxiliary addresses
//! - Report bind failures with the address that failed

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a TCP listener on `addr` (`host:port`).
pub async fn bind(addr: &str) -> Result<TcpListener, ListenerError> {
    let listener = TcpListener::bind(addr).await.map_err(|source| ListenerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    let local_addr: SocketAddr = listener.local_addr().map_err(|source| ListenerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    tracing::info!(address = %local_addr, "Listener bound");

    Ok(listener)
}

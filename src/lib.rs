//! Single-backend HTTP(S) gateway.
//!
//! Terminates client connections (optionally over TLS), forwards every
//! request to one fixed backend with `PR-Forwarded-*` context headers, and
//! can run a port 80 listener that redirects to HTTPS while relaying ACME
//! HTTP-01 challenges.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;

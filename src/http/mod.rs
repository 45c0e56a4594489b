//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Primary listener (plaintext or TLS)
//!     → server.rs (axum / axum-server setup)
//!     → proxy.rs (per-request handler)
//!     → director.rs (forwarded context, URI rewrite)
//!     → headers.rs (hop-by-hop stripping, X-Forwarded-For)
//!     → backend over plain HTTP → response streamed back
//!
//! Auxiliary listener (port 80, plaintext)
//!     → redirect.rs
//!         ├─ /.well-known/acme-challenge/* → acme.rs → backend
//!         └─ everything else → 301 to the secure scheme
//! ```

pub mod acme;
pub mod director;
pub mod headers;
pub mod proxy;
pub mod redirect;
pub mod server;

pub use director::{ForwardedContext, ForwardingDirector};
pub use server::{GatewayServer, RedirectServer};

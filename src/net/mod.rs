//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind primary / auxiliary sockets)
//!     → tls.rs (load PEM material when serving HTTPS)
//!     → Hand off to HTTP layer
//!
//! Per request
//!     → addr.rs (peer socket address → bare client IP)
//! ```
//!
//! # Design Decisions
//! - Binding happens before serving so failures surface at startup
//! - TLS is optional and handled transparently by axum-server

pub mod addr;
pub mod listener;
pub mod tls;

pub use addr::parse_remote_addr;
pub use listener::{bind, ListenerError};

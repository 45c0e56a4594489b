//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment / command line
//!     → loader.rs (clap, env-backed arguments)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc with both listeners
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Empty environment values mean "unset", never "empty string"
//! - Validation separates parsing (clap) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, GatewayArgs};
pub use schema::{resolve_scheme, GatewayConfig};

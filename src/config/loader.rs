//! Configuration loading from the process environment.
//!
//! Every setting is read from an environment variable; the same settings are
//! accepted as command line flags, which take precedence.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw gateway settings as supplied by the operator.
#[derive(Debug, Clone, Parser)]
#[command(name = "pr-gateway")]
#[command(about = "Single-backend HTTP(S) gateway with forwarded-context headers", long_about = None)]
pub struct GatewayArgs {
    /// Header trusted to signal that an upstream edge already served HTTPS
    #[arg(long, env = "REVERSE_PROXY_HEADER", default_value = "")]
    pub reverse_proxy_header: String,

    /// "true" starts the port 80 redirect and ACME relay listener
    #[arg(long, env = "REDIRECT_SERVER", default_value = "")]
    pub redirect_server: String,

    /// Interface to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// Primary listener port
    #[arg(long, env = "BIND_PORT", default_value_t = 80)]
    pub bind_port: u16,

    /// Backend host:port every request is forwarded to
    #[arg(long, env = "INTERNAL_ADDRESS")]
    pub internal_address: String,

    /// PEM certificate chain; TLS is enabled when both this and the key are set
    #[arg(long, env = "CERT_PATH", default_value = "")]
    pub cert_path: String,

    /// PEM private key
    #[arg(long, env = "KEY_PATH", default_value = "")]
    pub key_path: String,

    /// Port of the redirect and ACME relay listener
    #[arg(long, env = "REDIRECT_PORT", default_value_t = 80)]
    pub redirect_port: u16,

    /// Per-request deadline on the primary listener, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Deadline for relaying an ACME challenge from the backend, in seconds
    #[arg(long, env = "ACME_TIMEOUT_SECS", default_value_t = 30)]
    pub acme_timeout_secs: u64,
}

impl From<GatewayArgs> for GatewayConfig {
    fn from(args: GatewayArgs) -> Self {
        Self {
            trust_header: non_empty(args.reverse_proxy_header),
            redirect_enabled: args.redirect_server == "true",
            bind_host: args.bind_host,
            bind_port: args.bind_port,
            backend_address: args.internal_address,
            cert_path: non_empty(args.cert_path).map(PathBuf::from),
            key_path: non_empty(args.key_path).map(PathBuf::from),
            redirect_port: args.redirect_port,
            request_timeout_secs: args.request_timeout_secs,
            acme_timeout_secs: args.acme_timeout_secs,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Build and validate the gateway configuration from parsed arguments.
pub fn load_config(args: GatewayArgs) -> Result<GatewayConfig, ConfigError> {
    let config = GatewayConfig::from(args);

    if config.cert_path.is_some() != config.key_path.is_some() {
        tracing::warn!(
            cert_path = ?config.cert_path,
            key_path = ?config.key_path,
            "Only one of CERT_PATH and KEY_PATH is set; serving plaintext"
        );
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntax)
//! - Reject values the request path would otherwise have to re-check
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before any listener is bound

use axum::http::uri::Authority;
use axum::http::HeaderName;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("INTERNAL_ADDRESS must be set")]
    MissingBackend,

    #[error("INTERNAL_ADDRESS {0:?} is not a valid host:port")]
    InvalidBackend(String),

    #[error("REVERSE_PROXY_HEADER {0:?} is not a valid header name")]
    InvalidTrustHeader(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Check the configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = backend_authority(config) {
        errors.push(e);
    }
    if let Err(e) = trust_header_name(config) {
        errors.push(e);
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("REQUEST_TIMEOUT_SECS"));
    }
    if config.acme_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("ACME_TIMEOUT_SECS"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Backend address as a URI authority.
pub fn backend_authority(config: &GatewayConfig) -> Result<Authority, ValidationError> {
    if config.backend_address.is_empty() {
        return Err(ValidationError::MissingBackend);
    }
    Authority::from_str(&config.backend_address)
        .map_err(|_| ValidationError::InvalidBackend(config.backend_address.clone()))
}

/// Trust header as a header name, if one is configured.
pub fn trust_header_name(config: &GatewayConfig) -> Result<Option<HeaderName>, ValidationError> {
    config
        .trust_header
        .as_deref()
        .map(|name| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ValidationError::InvalidTrustHeader(name.to_string()))
        })
        .transpose()
}

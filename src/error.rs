//! Per-request errors.
//!
//! Every failure while handling a single request ends that request with an
//! HTTP error response; none of them reach the listener or the process.

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Duration;
use thiserror::Error;

/// Errors that end a single request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Peer address without a `:port` suffix.
    #[error("Malformed remote address: {0:?}")]
    MalformedAddress(String),

    /// Request carried neither a Host header nor an absolute URI.
    #[error("Request has no host")]
    MissingHost,

    /// A computed header value contained forbidden bytes.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    /// The backend URI or request could not be assembled.
    #[error("Invalid backend request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    /// The backend could not be reached or broke the exchange.
    #[error("Backend request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The backend response body could not be read.
    #[error("Backend response body failed: {0}")]
    UpstreamBody(#[from] hyper::Error),

    /// The backend did not answer before the deadline.
    #[error("Backend did not respond within {0:?}")]
    UpstreamTimeout(Duration),
}

impl GatewayError {
    /// Status code returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingHost => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_) | GatewayError::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::MalformedAddress(_)
            | GatewayError::InvalidHeader(_)
            | GatewayError::InvalidRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Client gets the canonical reason only; details stay in the logs.
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

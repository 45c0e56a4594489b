//! Plaintext-to-secure redirect listener.
//!
//! # Responsibilities
//! - Relay ACME HTTP-01 challenges to the backend
//! - Answer every other request with a 301 to the secure scheme
//!
//! # Design Decisions
//! - A non-empty trust header means an edge already serves HTTPS on the
//!   default port, so no port is carried into the target
//! - Otherwise the bind port is carried unless it is the scheme's default

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::schema::{GatewayConfig, HTTPS};
use crate::config::validation::{backend_authority, trust_header_name, ValidationError};
use crate::error::GatewayError;
use crate::http::acme::{challenge_token, AcmeRelay};
use crate::http::director::request_host;
use crate::http::proxy::backend_client;

/// Computes redirect targets for the auxiliary listener.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    trust_header: Option<HeaderName>,
    scheme: &'static str,
    bind_port: u16,
}

impl RedirectPolicy {
    pub fn new(config: &GatewayConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            trust_header: trust_header_name(config)?,
            scheme: config.scheme(),
            bind_port: config.bind_port,
        })
    }

    fn trusted<B>(&self, req: &Request<B>) -> bool {
        self.trust_header
            .as_ref()
            .and_then(|name| req.headers().get(name))
            .is_some_and(|value| !value.is_empty())
    }

    /// Absolute URL `req` should be redirected to.
    pub fn target<B>(&self, req: &Request<B>) -> Result<String, GatewayError> {
        let host = request_host(req).ok_or(GatewayError::MissingHost)?;
        let hostname = strip_port(&host);
        if hostname.is_empty() {
            return Err(GatewayError::MissingHost);
        }

        let (scheme, port) = if self.trusted(req) {
            (HTTPS, None)
        } else {
            let port = Some(self.bind_port).filter(|p| *p != default_port(self.scheme));
            (self.scheme, port)
        };

        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Ok(match port {
            Some(port) => format!("{}://{}:{}{}", scheme, hostname, port, path),
            None => format!("{}://{}{}", scheme, hostname, path),
        })
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme == HTTPS {
        443
    } else {
        80
    }
}

// "example.com:80" -> "example.com", "[::1]:80" -> "[::1]".
fn strip_port(host: &str) -> &str {
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// State shared by the auxiliary listener's handlers.
#[derive(Clone)]
pub struct RedirectState {
    pub policy: Arc<RedirectPolicy>,
    pub relay: AcmeRelay,
}

/// Build the auxiliary router from validated configuration.
pub fn redirect_router(config: &GatewayConfig) -> Result<Router, ValidationError> {
    let state = RedirectState {
        policy: Arc::new(RedirectPolicy::new(config)?),
        relay: AcmeRelay::new(backend_client(), backend_authority(config)?, config.acme_timeout()),
    };

    Ok(Router::new()
        .route("/{*path}", any(redirect_handler))
        .route("/", any(redirect_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http()))
}

/// Relay ACME challenges, redirect everything else.
async fn redirect_handler(State(state): State<RedirectState>, request: Request<Body>) -> Response {
    let token = challenge_token(request.uri().path()).map(str::to_string);
    if let Some(token) = token {
        return match state.relay.relay(&token).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "ACME challenge relay failed");
                e.into_response()
            }
        };
    }

    let location = match state.policy.target(&request) {
        Ok(location) => location,
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), error = %e, "Cannot build redirect");
            return e.into_response();
        }
    };

    match HeaderValue::from_str(&location) {
        Ok(value) => {
            tracing::debug!(from = %request.uri(), to = %location, "Redirecting");
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response()
        }
        Err(e) => GatewayError::from(e).into_response(),
    }
}

//! Request rewriting toward the fixed backend.
//!
//! # Responsibilities
//! - Capture the forwarded context before the request is mutated
//! - Overwrite the PR-Forwarded-* headers
//! - Point the request URI at the backend over plain HTTP
//!
//! # Design Decisions
//! - The original host only survives in the forwarded URL and the Host header
//! - Client-supplied PR-Forwarded-* values are always replaced

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri};

use crate::config::validation::{backend_authority, trust_header_name, ValidationError};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::headers::{PR_FORWARDED_FOR, PR_FORWARDED_HEADER, PR_FORWARDED_URL};
use crate::net::parse_remote_addr;

/// Metadata describing the original request, computed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedContext {
    /// Raw value of the trust header, empty when unset or absent.
    pub forwarded_header: HeaderValue,
    /// `scheme://host` as served by the gateway.
    pub forwarded_url: String,
    /// Bare IP of the peer.
    pub forwarded_for: String,
}

impl ForwardedContext {
    /// Write the context onto `headers`, replacing any existing values.
    pub fn apply(self, headers: &mut axum::http::HeaderMap) -> Result<(), GatewayError> {
        let url = HeaderValue::from_str(&self.forwarded_url)?;
        let client = HeaderValue::from_str(&self.forwarded_for)?;

        headers.insert(PR_FORWARDED_HEADER, self.forwarded_header);
        headers.insert(PR_FORWARDED_URL, url);
        headers.insert(PR_FORWARDED_FOR, client);
        Ok(())
    }
}

/// Rewrites inbound requests so they target the backend.
#[derive(Debug, Clone)]
pub struct ForwardingDirector {
    trust_header: Option<HeaderName>,
    claimed_scheme: &'static str,
    backend: Authority,
}

impl ForwardingDirector {
    /// Build a director from validated configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, ValidationError> {
        Ok(Self {
            trust_header: trust_header_name(config)?,
            claimed_scheme: config.scheme(),
            backend: backend_authority(config)?,
        })
    }

    /// Compute the forwarded context for `req` arriving from `remote_addr`.
    pub fn context<B>(&self, req: &Request<B>, remote_addr: &str) -> Result<ForwardedContext, GatewayError> {
        let forwarded_for = parse_remote_addr(remote_addr)?;
        let host = request_host(req).unwrap_or_default();

        let forwarded_header = self
            .trust_header
            .as_ref()
            .and_then(|name| req.headers().get(name))
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""));

        Ok(ForwardedContext {
            forwarded_header,
            forwarded_url: format!("{}://{}", self.claimed_scheme, host),
            forwarded_for,
        })
    }

    /// Rewrite `req` in place for dispatch to the backend.
    pub fn direct<B>(&self, req: &mut Request<B>, remote_addr: &str) -> Result<(), GatewayError> {
        let context = self.context(req, remote_addr)?;

        // HTTP/2 carries the host in the URI only; keep it for the backend.
        if !req.headers().contains_key(header::HOST) {
            if let Some(authority) = req.uri().authority() {
                let host = HeaderValue::from_str(authority.as_str())?;
                req.headers_mut().insert(header::HOST, host);
            }
        }

        context.apply(req.headers_mut())?;

        let mut parts = req.uri().clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.backend.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        *req.uri_mut() = Uri::from_parts(parts).map_err(axum::http::Error::from)?;

        Ok(())
    }
}

/// Host the client addressed: the Host header, else the URI authority.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))
}

//! ACME HTTP-01 challenge relay.
//!
//! Challenge lookups arriving on the redirect listener are fetched from the
//! backend over plain HTTP and returned to the certificate authority as-is,
//! so issuance keeps working while all other port 80 traffic is redirected.
//!
//! The whole exchange, body included, runs under one deadline. Challenge
//! bodies are a few dozen bytes, so the body is read in full before the
//! response is returned.

use axum::body::Body;
use axum::http::uri::Authority;
use axum::http::{Request, Response, Uri};
use http_body_util::BodyExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::time::Duration;

use crate::error::GatewayError;
use crate::http::headers::{merge_headers, strip_hop_by_hop};

/// Well-known path prefix for HTTP-01 challenges.
pub const ACME_CHALLENGE_PREFIX: &str = "/.well-known/acme-challenge/";

/// Token of a challenge path (its final segment), or `None` for other paths.
///
/// The path is split as received, before percent-decoding, so an encoded
/// `%2F` stays inside the token. Issued tokens are base64url and never
/// contain escapes.
pub fn challenge_token(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(ACME_CHALLENGE_PREFIX)?;
    Some(rest.rsplit('/').next().unwrap_or(rest))
}

/// Fetches challenge responses from the backend.
#[derive(Clone)]
pub struct AcmeRelay {
    client: Client<HttpConnector, Body>,
    backend: Authority,
    timeout: Duration,
}

impl AcmeRelay {
    pub fn new(client: Client<HttpConnector, Body>, backend: Authority, timeout: Duration) -> Self {
        Self {
            client,
            backend,
            timeout,
        }
    }

    /// Backend URI serving `token`.
    pub fn challenge_uri(&self, token: &str) -> Result<Uri, GatewayError> {
        Ok(Uri::builder()
            .scheme("http")
            .authority(self.backend.clone())
            .path_and_query(format!("{}{}", ACME_CHALLENGE_PREFIX, token))
            .build()?)
    }

    /// Relay the challenge for `token`: backend status, headers and body.
    pub async fn relay(&self, token: &str) -> Result<Response<Body>, GatewayError> {
        let uri = self.challenge_uri(token)?;
        tracing::debug!(token = %token, uri = %uri, "Relaying ACME challenge");

        let request = Request::get(uri).body(Body::empty())?;
        let exchange = async {
            let upstream = self.client.request(request).await?;
            let (parts, body) = upstream.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok::<_, GatewayError>((parts, body))
        };

        let (parts, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| GatewayError::UpstreamTimeout(self.timeout))??;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = parts.status;
        merge_headers(response.headers_mut(), &parts.headers);
        strip_hop_by_hop(response.headers_mut());

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper_util::rt::TokioExecutor;
    use std::str::FromStr;

    #[test]
    fn test_challenge_token() {
        assert_eq!(challenge_token("/.well-known/acme-challenge/abc123"), Some("abc123"));
        assert_eq!(challenge_token("/.well-known/acme-challenge/a/b/tok"), Some("tok"));
        assert_eq!(challenge_token("/.well-known/acme-challenge/"), Some(""));
        assert_eq!(challenge_token("/.well-known/acme-challenge"), None);
        assert_eq!(challenge_token("/foo"), None);
    }

    #[test]
    fn test_challenge_token_is_not_percent_decoded() {
        assert_eq!(challenge_token("/.well-known/acme-challenge/a%2Fb"), Some("a%2Fb"));
        assert_eq!(challenge_token("/.well-known/acme-challenge/x%2F/y"), Some("y"));
    }

    #[tokio::test]
    async fn test_challenge_uri() {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let relay = AcmeRelay::new(
            client,
            Authority::from_str("backend:8080").unwrap(),
            Duration::from_secs(5),
        );

        assert_eq!(
            relay.challenge_uri("tok-1").unwrap().to_string(),
            "http://backend:8080/.well-known/acme-challenge/tok-1"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_bad_gateway() {
        // Bind then drop to get a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let relay = AcmeRelay::new(
            client,
            Authority::from_str(&format!("127.0.0.1:{}", port)).unwrap(),
            Duration::from_secs(5),
        );

        let err = relay.relay("tok").await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }
}

//! Primary listener request handling.
//!
//! # Responsibilities
//! - Run the forwarding director on every inbound request
//! - Dispatch the rewritten request to the backend
//! - Stream the backend response back to the client
//! - Tunnel protocol upgrades (WebSocket) once the backend switches protocols
//!
//! # Design Decisions
//! - No retries: a backend failure is answered with 502 immediately
//! - Bodies are streamed in both directions, never buffered
//! - The request timeout bounds the wait for the response head; body
//!   timeouts of the same length bound every pause while a request or
//!   response body is in flight. A body that keeps trickling data is not
//!   cut off, and an upgraded tunnel has no deadline at all.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper::upgrade::OnUpgrade;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::error::GatewayError;
use crate::http::director::ForwardingDirector;
use crate::http::headers::{
    append_forwarded_for, set_upgrade, strip_hop_by_hop, upgrade_protocol, PR_FORWARDED_FOR,
};

/// HTTP client used to reach the backend.
pub fn backend_client() -> Client<HttpConnector, Body> {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct ProxyState {
    pub director: Arc<ForwardingDirector>,
    pub client: Client<HttpConnector, Body>,
}

/// Build the primary router with its middleware layers.
#[allow(deprecated)]
pub fn proxy_router(director: ForwardingDirector, request_timeout: Duration) -> Router {
    let state = ProxyState {
        director: Arc::new(director),
        client: backend_client(),
    };

    Router::new()
        .route("/{*path}", any(proxy_handler))
        .route("/", any(proxy_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(RequestBodyTimeoutLayer::new(request_timeout))
        .layer(ResponseBodyTimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Rewrite the request toward the backend and relay its response.
async fn proxy_handler(
    State(state): State<ProxyState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    match forward(state, remote_addr, request).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(remote_addr = %remote_addr, error = %e, "Proxy request failed");
            } else {
                tracing::debug!(remote_addr = %remote_addr, error = %e, "Proxy request rejected");
            }
            e.into_response()
        }
    }
}

async fn forward(
    state: ProxyState,
    remote_addr: SocketAddr,
    mut request: Request<Body>,
) -> Result<Response, GatewayError> {
    let protocol = upgrade_protocol(request.headers());
    let client_upgrade = protocol.as_ref().map(|_| hyper::upgrade::on(&mut request));

    strip_hop_by_hop(request.headers_mut());
    if let Some(protocol) = protocol {
        set_upgrade(request.headers_mut(), protocol);
    }
    state.director.direct(&mut request, &remote_addr.to_string())?;

    let client_ip = request
        .headers()
        .get(PR_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    append_forwarded_for(request.headers_mut(), &client_ip)?;

    // The backend pool speaks HTTP/1.1 whatever the client negotiated.
    *request.version_mut() = Version::HTTP_11;

    tracing::debug!(
        method = %request.method(),
        uri = %request.uri(),
        "Forwarding request"
    );

    let mut response = state.client.request(request).await?;

    if response.status() == StatusCode::SWITCHING_PROTOCOLS {
        if let Some(client_upgrade) = client_upgrade {
            let backend_upgrade = hyper::upgrade::on(&mut response);
            tokio::spawn(tunnel(client_upgrade, backend_upgrade, remote_addr));

            let protocol = response.headers().get(header::UPGRADE).cloned();
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            if let Some(protocol) = protocol {
                set_upgrade(&mut parts.headers, protocol);
            }
            return Ok(Response::from_parts(parts, Body::new(body)));
        }
    }

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    Ok(Response::from_parts(parts, Body::new(body)))
}

/// Splice the client and backend connections once both have switched
/// protocols. Runs until either side closes.
async fn tunnel(client: OnUpgrade, backend: OnUpgrade, remote_addr: SocketAddr) {
    let (client, backend) = match tokio::try_join!(client, backend) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(remote_addr = %remote_addr, error = %e, "Protocol upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut backend = TokioIo::new(backend);
    match tokio::io::copy_bidirectional(&mut client, &mut backend).await {
        Ok((sent, received)) => {
            tracing::debug!(remote_addr = %remote_addr, sent, received, "Upgraded connection closed");
        }
        Err(e) => {
            tracing::debug!(remote_addr = %remote_addr, error = %e, "Upgraded connection ended");
        }
    }
}

//! Header manipulation.
//!
//! # Responsibilities
//! - Copy header sets while keeping repeated values
//! - Strip hop-by-hop headers before a message crosses the gateway
//! - Append the client IP to X-Forwarded-For
//! - Recognise and re-attach protocol upgrade headers
//!
//! # Design Decisions
//! - Forwarded-context headers are always overwritten, never appended
//! - Headers named by `Connection` are treated as hop-by-hop too

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Echo of the trust header as the client sent it.
pub const PR_FORWARDED_HEADER: HeaderName = HeaderName::from_static("pr-forwarded-header");

/// URL the gateway believes it served (`scheme://host`).
pub const PR_FORWARDED_URL: HeaderName = HeaderName::from_static("pr-forwarded-url");

/// Bare IP of the connecting peer.
pub const PR_FORWARDED_FOR: HeaderName = HeaderName::from_static("pr-forwarded-for");

const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Copy every value of every header from `src` into `dst`.
///
/// Values are appended, so repeated headers keep their multiplicity and
/// existing values in `dst` are kept.
pub fn merge_headers(dst: &mut HeaderMap, src: &HeaderMap) {
    for (name, value) in src.iter() {
        dst.append(name.clone(), value.clone());
    }
}

/// Remove connection-scoped headers.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Protocol requested through `Upgrade`, when `Connection` asks for one.
pub fn upgrade_protocol(headers: &HeaderMap) -> Option<HeaderValue> {
    let requested = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    if requested {
        headers.get(header::UPGRADE).cloned()
    } else {
        None
    }
}

/// Restore the upgrade headers removed by [`strip_hop_by_hop`].
pub fn set_upgrade(headers: &mut HeaderMap, protocol: HeaderValue) {
    headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
    headers.insert(header::UPGRADE, protocol);
}

/// Append `client_ip` to any X-Forwarded-For chain already present.
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: &str) -> Result<(), header::InvalidHeaderValue> {
    let prior: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        client_ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client_ip)
    };

    headers.insert("x-forwarded-for", HeaderValue::from_str(&value)?);
    Ok(())
}

//! Client address extraction.

use crate::error::GatewayError;

/// Strip the port (and IPv6 brackets) from a peer socket address.
///
/// `"203.0.113.5:54321"` yields `"203.0.113.5"` and `"[::1]:54321"` yields
/// `"::1"`. Only the last colon separates the port; unbracketed IPv6 hosts
/// are not special-cased. Input without any colon is rejected.
pub fn parse_remote_addr(remote_addr: &str) -> Result<String, GatewayError> {
    let colon = remote_addr
        .rfind(':')
        .ok_or_else(|| GatewayError::MalformedAddress(remote_addr.to_string()))?;

    Ok(remote_addr[..colon]
        .replacen('[', "", 1)
        .replacen(']', "", 1))
}

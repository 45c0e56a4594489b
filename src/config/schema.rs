//! Configuration schema definitions.
//!
//! The gateway has a single, flat configuration. It is built once at
//! startup and shared read-only (behind an `Arc`) by every listener and
//! request handler.

use std::path::PathBuf;
use std::time::Duration;

/// Scheme reported for a gateway serving TLS.
pub const HTTPS: &str = "https";

/// Scheme reported for a plaintext gateway.
pub const HTTP: &str = "http";

/// Resolve the scheme the gateway claims to be serving.
pub fn resolve_scheme(secure: bool) -> &'static str {
    if secure {
        HTTPS
    } else {
        HTTP
    }
}

/// Root configuration for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Header trusted to indicate an upstream edge already terminated TLS.
    pub trust_header: Option<String>,

    /// Run the auxiliary redirect + ACME listener.
    pub redirect_enabled: bool,

    /// Interface to bind both listeners on.
    pub bind_host: String,

    /// Primary listener port.
    pub bind_port: u16,

    /// Fixed backend `host:port`.
    pub backend_address: String,

    /// PEM certificate chain.
    pub cert_path: Option<PathBuf>,

    /// PEM private key.
    pub key_path: Option<PathBuf>,

    /// Auxiliary listener port.
    pub redirect_port: u16,

    /// Per-request deadline on the primary listener.
    pub request_timeout_secs: u64,

    /// Deadline for the outbound ACME challenge fetch.
    pub acme_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            trust_header: None,
            redirect_enabled: false,
            bind_host: "0.0.0.0".to_string(),
            bind_port: 80,
            backend_address: "127.0.0.1:8080".to_string(),
            cert_path: None,
            key_path: None,
            redirect_port: 80,
            request_timeout_secs: 120,
            acme_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// TLS is served only when both certificate and key are configured.
    pub fn secure(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }

    /// Scheme claimed toward clients and reported in forwarded metadata.
    pub fn scheme(&self) -> &'static str {
        resolve_scheme(self.secure())
    }

    /// Whether the auxiliary listener should be started.
    pub fn runs_redirect_listener(&self) -> bool {
        self.redirect_enabled && self.bind_port != self.redirect_port
    }

    /// `host:port` of the primary listener.
    pub fn primary_address(&self) -> String {
        join_host_port(&self.bind_host, self.bind_port)
    }

    /// `host:port` of the auxiliary listener.
    pub fn redirect_address(&self) -> String {
        join_host_port(&self.bind_host, self.redirect_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn acme_timeout(&self) -> Duration {
        Duration::from_secs(self.acme_timeout_secs)
    }
}

// IPv6 literals need brackets once a port is attached.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

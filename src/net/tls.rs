//! TLS configuration and certificate loading.

use axum_server::tls_rustls::RustlsConfig;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading TLS material. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("No private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("Invalid TLS material: {0}")]
    Rustls(#[source] std::io::Error),
}

/// Load TLS configuration from certificate and key files.
///
/// The PEM files are checked up front so a missing or mismatched file is
/// reported by path rather than as an opaque rustls error.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let cert_pem = read(cert_path).await?;
    let key_pem = read(key_path).await?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem.as_slice()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem.as_slice())).map_err(
        |source| TlsError::Read {
            path: key_path.to_path_buf(),
            source,
        },
    )?;
    if key.is_none() {
        return Err(TlsError::NoPrivateKey(key_path.to_path_buf()));
    }

    tracing::debug!(
        cert_path = ?cert_path,
        certificates = certs.len(),
        "TLS material loaded"
    );

    RustlsConfig::from_pem(cert_pem, key_pem)
        .await
        .map_err(TlsError::Rustls)
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

//! End-to-end test of a secure gateway started through the lifecycle.

use axum::http::StatusCode;
use rcgen::{generate_simple_self_signed, CertifiedKey};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName};
use tokio_rustls::rustls::{crypto::aws_lc_rs, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use pr_gateway::config::GatewayConfig;
use pr_gateway::lifecycle::{self, Shutdown};

mod common;

/// Write a self-signed `localhost` certificate and key, returning their
/// paths and the certificate for the client's trust store.
fn write_self_signed() -> (PathBuf, PathBuf, CertificateDer<'static>) {
    let CertifiedKey { cert, signing_key } = generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let dir = std::env::temp_dir().join(format!("pr-gateway-tls-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, signing_key.serialize_pem()).unwrap();

    (cert_path, key_path, cert.der().clone())
}

fn connector(trusted: CertificateDer<'static>) -> TlsConnector {
    let mut roots = RootCertStore::empty();
    roots.add(trusted).unwrap();

    let config = ClientConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(roots)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[tokio::test]
async fn test_secure_gateway_with_redirect_listener() {
    let backend = common::start_echo_backend().await;
    let (cert_path, key_path, cert) = write_self_signed();

    let primary: SocketAddr = common::unused_addr();
    let auxiliary: SocketAddr = common::unused_addr();
    let config = GatewayConfig {
        bind_host: "127.0.0.1".into(),
        bind_port: primary.port(),
        redirect_enabled: true,
        redirect_port: auxiliary.port(),
        backend_address: backend.to_string(),
        cert_path: Some(cert_path),
        key_path: Some(key_path),
        ..GatewayConfig::default()
    };

    let shutdown = Shutdown::new();
    let runner = shutdown.clone();
    let server = tokio::spawn(async move { lifecycle::run(config, &runner).await });

    common::wait_for_listener(primary).await;
    common::wait_for_listener(auxiliary).await;

    // Primary listener: TLS handshake, then a forwarded request.
    let tcp = TcpStream::connect(primary).await.unwrap();
    let mut tls = connector(cert)
        .connect(ServerName::try_from("localhost").unwrap(), tcp)
        .await
        .expect("TLS handshake failed");
    tls.write_all(b"GET /secure HTTP/1.1\r\nHost: secure.example.com\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(10), common::read_to_close(&mut tls))
        .await
        .expect("Gateway did not answer over TLS");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
    assert!(reply.contains("get /secure http/1.1\r\n"), "{reply}");
    assert!(reply.contains("pr-forwarded-url: https://secure.example.com\r\n"), "{reply}");

    // Auxiliary listener: plaintext redirect to the secure port.
    let res = common::client()
        .get(format!("http://{}/foo", auxiliary))
        .header("host", "example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()["location"],
        format!("https://example.com:{}/foo", primary.port()).as_str()
    );

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("Gateway did not stop")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");
}

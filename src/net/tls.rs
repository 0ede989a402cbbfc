//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Errors while building the TLS acceptor.
///
/// Messages never include the certificate or key path.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("cannot read certificate: {0}")]
    Certificate(#[source] io::Error),

    #[error("cannot read private key: {0}")]
    PrivateKey(#[source] io::Error),

    #[error("no certificate found in PEM input")]
    NoCertificates,

    #[error("no private key found in PEM input")]
    NoPrivateKey,

    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Load a TLS 1.3-only server configuration from PEM certificate and key files.
pub fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    let mut cert_reader = BufReader::new(File::open(cert_path).map_err(TlsError::Certificate)?);
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(TlsError::Certificate)?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates);
    }

    let mut key_reader = BufReader::new(File::open(key_path).map_err(TlsError::PrivateKey)?);
    let key = rustls_pemfile::private_key(&mut key_reader)
        .map_err(TlsError::PrivateKey)?
        .ok_or(TlsError::NoPrivateKey)?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

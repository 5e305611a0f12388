//! TLS helpers for explicit FTPS (`AUTH TLS`, RFC 4217).
//!
//! - Builds one rustls `ClientConfig` per session with certificate
//!   verification switched off: internal FTP servers commonly present
//!   self-signed certificates.
//! - `upgrade_to_tls` swaps a plain control codec for a TLS one.
//! - `wrap_data_stream` secures every passive-mode data socket with the
//!   control channel's config, which also lets rustls resume the session.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::{bounded, FtpCodec};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// Build the client configuration shared by the control and data channels.
pub fn build_client_config() -> FtpResult<Arc<rustls::ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| FtpError::tls_failed(format!("TLS config: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoCertVerifier { provider }))
        .with_no_client_auth();
    log::warn!("FTPS certificate verification disabled");
    Ok(Arc::new(config))
}

/// Upgrade an existing **plain** control connection to TLS.
///
/// Called after a successful `AUTH TLS` + 234 reply. Consumes the plain
/// codec and returns a new one, so the socket and its reader change together.
/// The handshake is bounded by the codec's I/O timeout, if any.
pub async fn upgrade_to_tls(
    codec: FtpCodec,
    config: Arc<rustls::ClientConfig>,
    host: &str,
) -> FtpResult<FtpCodec> {
    let io_timeout = codec.io_timeout();
    let tcp = codec.into_plain_tcp()?;
    let tls = handshake(tcp, config, host, io_timeout, "Control channel").await?;
    Ok(FtpCodec::from_tls(tls, io_timeout))
}

/// Create a TLS-wrapped data channel, bounded by `io_timeout` when set.
pub async fn wrap_data_stream(
    tcp: TcpStream,
    config: Arc<rustls::ClientConfig>,
    host: &str,
    io_timeout: Option<Duration>,
) -> FtpResult<TlsStream<TcpStream>> {
    handshake(tcp, config, host, io_timeout, "Data channel").await
}

async fn handshake(
    tcp: TcpStream,
    config: Arc<rustls::ClientConfig>,
    host: &str,
    io_timeout: Option<Duration>,
    channel: &str,
) -> FtpResult<TlsStream<TcpStream>> {
    let server_name = server_name(host).map_err(|e| handshake_failed(channel, e))?;
    let what = format!("{} TLS handshake", channel.to_lowercase());
    bounded(io_timeout, &what, async {
        TlsConnector::from(config)
            .connect(server_name, tcp)
            .await
            .map_err(|e| handshake_failed(channel, e))
    })
    .await
}

fn handshake_failed(channel: &str, err: impl std::fmt::Display) -> FtpError {
    FtpError::tls_failed(format!("{} TLS handshake: {}", channel, err))
}

/// SNI name for `host`; IP literals (bracketed or not) become IP server names.
fn server_name(host: &str) -> Result<ServerName<'static>, String> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_string())
        .map_err(|e| format!("invalid server name '{}': {}", host, e))
}

// ─── NoCertVerifier (for self-signed certs) ─────────────────────────

#[derive(Debug)]
struct NoCertVerifier {
    provider: Arc<rustls::crypto::CryptoProvider>,
}

impl rustls::client::danger::ServerCertVerifier for NoCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

//! Passive-mode data channel (RFC 959 `PASV`).
//!
//! One data connection per transfer command:
//! `PASV` → 227 → dial → (TLS) → command on the control channel → 125/150.
//! The returned `DataStream` is closed by dropping it.

use crate::ftp::connection::dial;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::tls;
use crate::ftp::types::ReplyCodes;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// Abstraction over a plain or TLS-wrapped data stream.
pub enum DataStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl DataStream {
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for DataStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for DataStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_flush(cx),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Self::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// TLS parameters captured at `AUTH TLS` time and reused for data sockets.
#[derive(Clone)]
pub struct DataTls {
    pub config: Arc<rustls::ClientConfig>,
    pub host: String,
}

// ─── PASV ────────────────────────────────────────────────────────────

/// Issue `PASV` and return the advertised `(host, port)`.
pub async fn enter_passive_mode(codec: &mut FtpCodec) -> FtpResult<(String, u16)> {
    let resp = codec
        .execute_expect("PASV", ReplyCodes::PASSIVE_MODE)
        .await?;
    parse_pasv_reply(&resp.text())
}

/// Parse `(h1,h2,h3,h4,p1,p2)` out of a 227 reply.
///
/// Response format: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
pub fn parse_pasv_reply(text: &str) -> FtpResult<(String, u16)> {
    let malformed =
        |why: &str| FtpError::malformed(format!("invalid PASV response ({}): {}", why, text));

    let start = text.find('(').ok_or_else(|| malformed("missing '('"))?;
    let len = text[start + 1..]
        .find(')')
        .ok_or_else(|| malformed("missing ')'"))?;
    let inner = &text[start + 1..start + 1 + len];

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 6 {
        let why = format!("expected 6 fields, got {}", parts.len());
        return Err(malformed(&why));
    }

    let mut nums = [0u8; 6];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = match part.parse::<u8>() {
            Ok(n) => n,
            Err(_) => {
                let why = format!("field '{}' is not a number in 0-255", part);
                return Err(malformed(&why));
            }
        };
    }

    let host = format!("{}.{}.{}.{}", nums[0], nums[1], nums[2], nums[3]);
    let port = u16::from(nums[4]) * 256 + u16::from(nums[5]);
    Ok((host, port))
}

// ─── Data connection ─────────────────────────────────────────────────

/// Negotiate passive mode, dial it, secure it if the control channel is TLS,
/// then issue `command` and wait for 125/150.
///
/// Any socket opened here is dropped (closed) before an error is returned.
pub async fn open_data_connection(
    codec: &mut FtpCodec,
    tls: Option<&DataTls>,
    command: &str,
    data_timeout: Duration,
) -> FtpResult<DataStream> {
    let (host, port) = enter_passive_mode(codec).await?;
    let addr = format!("{}:{}", host, port);
    log::trace!("data connection to {} for '{}'", addr, command);

    let tcp = match dial(&addr, data_timeout).await {
        Ok(tcp) => tcp,
        Err(e) => {
            let msg = format!("failed to open data connection: {}", e.message);
            return Err(FtpError::new(e.kind, msg));
        }
    };

    let stream = match tls {
        Some(t) => {
            let limit = codec.io_timeout();
            let secured = tls::wrap_data_stream(tcp, t.config.clone(), &t.host, limit).await?;
            DataStream::Tls(Box::new(secured))
        }
        None => DataStream::Plain(tcp),
    };

    codec
        .execute_expect(command, ReplyCodes::TRANSFER_STARTING)
        .await?;
    Ok(stream)
}

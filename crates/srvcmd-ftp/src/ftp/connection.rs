//! TCP transport for the FTP control connection.
//!
//! Dials with the configured timeout and reads the 220 greeting. Explicit
//! FTPS (`AUTH TLS`) is negotiated later by the client.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::types::{FtpOptions, FtpResponse, ReplyCodes};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

/// Dial `addr` within `limit`, mapping failures to connection/timeout errors.
pub async fn dial(addr: &str, limit: Duration) -> FtpResult<TcpStream> {
    let tcp = match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(tcp)) => tcp,
        Ok(Err(e)) => {
            let msg = format!("failed to connect to {}: {}", addr, e);
            return Err(FtpError::connection_failed(msg));
        }
        Err(_) => {
            let secs = limit.as_secs();
            let msg = format!("TCP connect to {} timed out after {}s", addr, secs);
            return Err(FtpError::timeout(msg));
        }
    };
    tcp.set_nodelay(true).ok();
    Ok(tcp)
}

/// Establish the control connection and return a ready-to-use codec
/// **plus** the server welcome banner.
pub async fn connect(addr: &str, options: &FtpOptions) -> FtpResult<(FtpCodec, FtpResponse)> {
    let tcp = dial(addr, options.connect_timeout()).await?;
    let mut codec = FtpCodec::from_tcp(tcp, options.io_timeout());
    let banner = codec.read_expect(ReplyCodes::GREETING).await?;
    log::debug!("connected to {}: {}", addr, banner.message());
    Ok((codec, banner))
}

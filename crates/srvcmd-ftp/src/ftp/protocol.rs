//! Low-level FTP command/response codec (RFC 959 §4).
//!
//! Handles:
//! - Sending FTP commands terminated with `\r\n`
//! - Reading single-line and multi-line replies
//! - Checking the 3-digit reply code against an acceptable set
//!
//! The transport and its line reader are one object (`ControlStream`), so a
//! TLS upgrade replaces both together.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::types::{FtpResponse, ReplyCodes};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// Plain TCP or TLS-wrapped control connection, buffered for line reads.
pub enum ControlStream {
    Plain(BufReader<TcpStream>),
    Tls(BufReader<TlsStream<TcpStream>>),
}

/// The FTP command/response codec.
pub struct FtpCodec {
    stream: ControlStream,
    io_timeout: Option<Duration>,
}

impl FtpCodec {
    /// Create a codec from a plain TCP stream.
    pub fn from_tcp(stream: TcpStream, io_timeout: Option<Duration>) -> Self {
        Self {
            stream: ControlStream::Plain(BufReader::new(stream)),
            io_timeout,
        }
    }

    /// Create a codec from a TLS-wrapped TCP stream.
    pub fn from_tls(stream: TlsStream<TcpStream>, io_timeout: Option<Duration>) -> Self {
        Self {
            stream: ControlStream::Tls(BufReader::new(stream)),
            io_timeout,
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.stream, ControlStream::Tls(_))
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout
    }

    /// Take back the plain socket for a TLS handshake.
    ///
    /// Fails if the connection is already TLS or if the server sent bytes
    /// past the last reply (they would be lost by the upgrade).
    pub fn into_plain_tcp(self) -> FtpResult<TcpStream> {
        match self.stream {
            ControlStream::Plain(reader) => {
                if !reader.buffer().is_empty() {
                    return Err(FtpError::protocol_error(
                        "Cannot upgrade: unread data on control connection",
                    ));
                }
                Ok(reader.into_inner())
            }
            ControlStream::Tls(_) => Err(FtpError::protocol_error(
                "Cannot upgrade: connection is already TLS",
            )),
        }
    }

    /// Send a raw FTP command; CRLF is appended here.
    pub async fn send_command(&mut self, cmd: &str) -> FtpResult<()> {
        let line = format!("{}\r\n", cmd);
        let limit = self.io_timeout;
        let stream = &mut self.stream;
        bounded(limit, "control write", async move {
            match stream {
                ControlStream::Plain(r) => {
                    r.get_mut().write_all(line.as_bytes()).await?;
                    r.get_mut().flush().await?;
                }
                ControlStream::Tls(r) => {
                    r.get_mut().write_all(line.as_bytes()).await?;
                    r.get_mut().flush().await?;
                }
            }
            Ok::<(), FtpError>(())
        })
        .await?;
        log::trace!(">>> {}", redact(cmd));
        Ok(())
    }

    /// Read a complete FTP response (possibly multi-line).
    pub async fn read_response(&mut self) -> FtpResult<FtpResponse> {
        let limit = self.io_timeout;
        let resp = match &mut self.stream {
            ControlStream::Plain(r) => bounded(limit, "control read", read_reply(r)).await?,
            ControlStream::Tls(r) => bounded(limit, "control read", read_reply(r)).await?,
        };
        let last = resp.lines.last().map(String::as_str).unwrap_or("");
        log::trace!("<<< {}", last);
        Ok(resp)
    }

    /// Read a response and require its code to be in `codes`.
    pub async fn read_expect(&mut self, codes: ReplyCodes) -> FtpResult<FtpResponse> {
        let resp = self.read_response().await?;
        check_reply(resp, codes)
    }

    /// Send a command and return the response.
    pub async fn execute(&mut self, cmd: &str) -> FtpResult<FtpResponse> {
        self.send_command(cmd).await?;
        self.read_response().await
    }

    /// Send a command and require a reply code in `codes`.
    pub async fn execute_expect(&mut self, cmd: &str, codes: ReplyCodes) -> FtpResult<FtpResponse> {
        self.send_command(cmd).await?;
        self.read_expect(codes).await
    }

    /// Shut down the write side (sends TLS `close_notify` when encrypted)
    /// and drop the socket. A peer that already hung up is not an error.
    pub async fn close(mut self) -> FtpResult<()> {
        let result = match &mut self.stream {
            ControlStream::Plain(r) => r.get_mut().shutdown().await,
            ControlStream::Tls(r) => r.get_mut().shutdown().await,
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if peer_gone(&e) => {
                log::debug!("control connection already closed by server: {}", e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn peer_gone(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
    )
}

/// Accept `resp` if its code is in `codes`, otherwise turn it into a protocol error.
pub fn check_reply(resp: FtpResponse, codes: ReplyCodes) -> FtpResult<FtpResponse> {
    if codes.contains(resp.code) {
        Ok(resp)
    } else {
        Err(FtpError::unexpected_reply(
            resp.code,
            format!("expected {}, got: {}", codes, resp.text()),
        ))
    }
}

/// Read one reply from a buffered reader.
///
/// Multi-line responses look like:
/// ```text
/// 220-Welcome to my FTP server
/// 220-This is line 2
/// 220 End of greeting
/// ```
pub async fn read_reply<R>(reader: &mut R) -> FtpResult<FtpResponse>
where
    R: AsyncBufRead + Unpin,
{
    let first = read_line(reader).await?;
    let code = parse_code(&first)?;
    let mut lines = vec![first];

    let is_multi = lines[0].as_bytes().get(3) == Some(&b'-');
    if is_multi {
        let terminator = format!("{} ", code);
        loop {
            let next = read_line(reader).await?;
            let done = next.starts_with(&terminator) || next == code.to_string();
            lines.push(next);
            if done {
                break;
            }
        }
    }

    Ok(FtpResponse { code, lines })
}

async fn read_line<R>(reader: &mut R) -> FtpResult<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Err(FtpError::disconnected("Server closed connection"));
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> FtpResult<u16> {
    let bytes = line.as_bytes();
    let well_formed = bytes.len() >= 3
        && bytes[..3].iter().all(u8::is_ascii_digit)
        && matches!(bytes.get(3), None | Some(b' ') | Some(b'-'));
    if !well_formed {
        let msg = format!("Invalid reply line: '{}'", line);
        return Err(FtpError::malformed(msg));
    }
    let code: u16 = match line[..3].parse() {
        Ok(code) => code,
        Err(_) => {
            let msg = format!("Invalid reply code in: '{}'", line);
            return Err(FtpError::malformed(msg));
        }
    };
    if !(100..600).contains(&code) {
        let msg = format!("Reply code out of range: '{}'", line);
        return Err(FtpError::malformed(msg));
    }
    Ok(code)
}

/// Run `fut` under an optional deadline.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, what: &str, fut: F) -> FtpResult<T>
where
    F: Future<Output = FtpResult<T>>,
{
    let d = match limit {
        Some(d) => d,
        None => return fut.await,
    };
    match tokio::time::timeout(d, fut).await {
        Ok(result) => result,
        Err(_) => {
            let msg = format!("{} timed out after {}s", what, d.as_secs());
            Err(FtpError::timeout(msg))
        }
    }
}

/// Keep passwords out of trace logs.
fn redact(cmd: &str) -> &str {
    let verb = cmd.get(..5).unwrap_or_default();
    if verb.eq_ignore_ascii_case("PASS ") {
        "PASS ****"
    } else {
        cmd
    }
}

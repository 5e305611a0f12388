//! FTP-specific error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Categorised FTP error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
    /// FTP response code that triggered the error, if any.
    pub code: Option<u16>,
    /// Transfer phase that failed, for upload/download/list.
    pub phase: Option<TransferPhase>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// TCP dial / DNS resolution failure.
    ConnectionFailed,
    /// AUTH TLS / TLS handshake failure.
    TlsFailed,
    /// Dial or configured I/O deadline elapsed.
    Timeout,
    /// Missing password or server refused the credentials.
    AuthFailed,
    /// Server replied with a code outside the acceptable set.
    ProtocolError,
    /// Server reply could not be parsed (e.g. a PASV tuple).
    MalformedResponse,
    /// Local file or directory could not be opened, created, read or written.
    IoError,
    /// Control connection closed by the server.
    Disconnected,
    /// Session or parameter unsuitable for FTP.
    InvalidConfig,
}

/// Stage of a transfer, reported alongside failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransferPhase {
    Open,
    EnsureDir,
    Dial,
    Copy,
    Finalize,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::EnsureDir => "ensure-dir",
            Self::Dial => "dial",
            Self::Copy => "copy",
            Self::Finalize => "finalize",
        };
        f.write_str(s)
    }
}

pub type FtpResult<T> = Result<T, FtpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
            phase: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Tag the error with a transfer phase unless an inner step already did.
    pub fn in_phase(mut self, phase: TransferPhase) -> Self {
        self.phase.get_or_insert(phase);
        self
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ConnectionFailed, msg)
    }

    pub fn tls_failed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::TlsFailed, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Timeout, msg)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::AuthFailed, msg)
    }

    /// Unexpected reply code; carries the code and the server's text.
    pub fn unexpected_reply(code: u16, text: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ProtocolError, text).with_code(code)
    }

    pub fn protocol_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ProtocolError, msg)
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::MalformedResponse, msg)
    }

    /// Local filesystem failure, naming the path involved.
    pub fn local_io(action: &str, path: &Path, err: std::io::Error) -> Self {
        Self::new(
            FtpErrorKind::IoError,
            format!("failed to {} {}: {}", action, path.display(), err),
        )
    }

    pub fn disconnected(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Disconnected, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::InvalidConfig, msg)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == FtpErrorKind::AuthFailed
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FTP {:?}", self.kind)?;
        if let Some(code) = self.code {
            write!(f, " {}", code)?;
        }
        if let Some(phase) = self.phase {
            write!(f, " during {}", phase)?;
        }
        write!(f, "] {}", self.message)
    }
}

impl std::error::Error for FtpError {}

/// Network-side I/O failures on an established connection.
impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(format!("I/O timeout: {}", e)),
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe => Self::disconnected(e.to_string()),
            _ => Self::connection_failed(e.to_string()),
        }
    }
}

impl From<FtpError> for String {
    fn from(e: FtpError) -> String {
        e.to_string()
    }
}

//! Shared types for the FTP crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ─── Reply-code sets ─────────────────────────────────────────────────

/// A set of reply codes that count as success for one command.
///
/// Servers disagree on codes for the same outcome (125 vs 150 for
/// "transfer starting", 226 vs 250 for "transfer complete"), so every read
/// is checked against a set rather than a single code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyCodes(&'static [u16]);

impl ReplyCodes {
    pub const GREETING: Self = Self(&[220]);
    pub const AUTH_TLS_ACCEPTED: Self = Self(&[234]);
    /// 331 = password required, 230 = already logged in.
    pub const USER_ACCEPTED: Self = Self(&[331, 230]);
    pub const LOGGED_IN: Self = Self(&[230]);
    pub const PASSIVE_MODE: Self = Self(&[227]);
    pub const TRANSFER_STARTING: Self = Self(&[125, 150]);
    pub const TRANSFER_COMPLETE: Self = Self(&[226, 250]);
    /// 550 is tolerated: it covers "already exists" and some permission failures alike.
    pub const DIRECTORY_CREATED_OR_EXISTS: Self = Self(&[257, 550]);

    pub const fn new(codes: &'static [u16]) -> Self {
        Self(codes)
    }

    pub fn contains(&self, code: u16) -> bool {
        self.0.contains(&code)
    }

    pub fn codes(&self) -> &'static [u16] {
        self.0
    }
}

impl fmt::Display for ReplyCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, code) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", code)?;
        }
        Ok(())
    }
}

// ─── FTP Response ────────────────────────────────────────────────────

/// A single FTP response (may be multi-line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full response text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Response text with the `NNN ` / `NNN-` prefixes removed.
    pub fn message(&self) -> String {
        let prefix = self.code.to_string();
        let stripped: Vec<&str> = self
            .lines
            .iter()
            .map(|l| match l.strip_prefix(prefix.as_str()) {
                Some(rest) if rest.starts_with(' ') || rest.starts_with('-') => &rest[1..],
                Some("") => "",
                _ => l.as_str(),
            })
            .collect();
        stripped.join("\n")
    }
}

// ─── Options ─────────────────────────────────────────────────────────

/// Tunables for a client connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FtpOptions {
    /// Control-connection dial timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Data-connection dial timeout in seconds.
    #[serde(default = "default_data_timeout")]
    pub data_timeout_secs: u64,
    /// Deadline for each control read/write, each data chunk and each
    /// TLS handshake (control upgrade and data channel).
    /// `None` keeps the classic behaviour: a stalled server blocks forever.
    #[serde(default)]
    pub io_timeout_secs: Option<u64>,
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_data_timeout() -> u64 {
    10
}

impl Default for FtpOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            data_timeout_secs: default_data_timeout(),
            io_timeout_secs: None,
        }
    }
}

impl FtpOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_secs.map(Duration::from_secs)
    }
}

// ─── Directory Listing ───────────────────────────────────────────────

/// Type of a remote filesystem entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FtpEntryKind {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// One line of a `LIST` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FtpEntry {
    pub name: String,
    /// Size in bytes. A negative or non-numeric size field parses as 0.
    pub size: u64,
    /// `None` when the timestamp could not be parsed.
    pub modified: Option<DateTime<Utc>>,
    pub kind: FtpEntryKind,
    pub permissions: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    /// Raw line from the server.
    pub raw: String,
}

impl FtpEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == FtpEntryKind::Directory
    }
}

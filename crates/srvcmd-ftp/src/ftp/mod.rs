//! # FTP/FTPS client (RFC 959, RFC 4217 explicit TLS)
//!
//! Architecture:
//! - `types`: reply-code sets, options, entries
//! - `error`: FTP-specific error type
//! - `protocol`: low-level command/response codec
//! - `connection`: TCP transport and greeting
//! - `tls`: AUTH TLS upgrade and data-channel wrapping
//! - `transfer`: passive-mode data channel
//! - `client`: stateful client (login, QUIT)
//! - `directory`: recursive MKD
//! - `file_ops`: upload, download, list
//! - `parser`: Unix LIST line parsing

pub mod client;
pub mod connection;
pub mod directory;
pub mod error;
pub mod file_ops;
pub mod parser;
pub mod protocol;
pub mod tls;
pub mod transfer;
pub mod types;

pub use client::FtpClient;
pub use error::{FtpError, FtpErrorKind, FtpResult, TransferPhase};
pub use types::*;

//! **srvcmd-ftp**: FTP/FTPS client used by ServerCommander.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |---|---|
//! | [`ftp::types`] | Reply-code sets, options, directory entries |
//! | [`ftp::error`] | `FtpError` with kind, reply code and transfer phase |
//! | [`ftp::protocol`] | Command/response codec (multi-line replies) |
//! | [`ftp::connection`] | TCP dial and greeting |
//! | [`ftp::tls`] | Explicit FTPS (`AUTH TLS`) and data-channel TLS |
//! | [`ftp::transfer`] | Passive-mode data connections (`PASV`) |
//! | [`ftp::client`] | Login and session lifecycle |
//! | [`ftp::directory`] | Recursive `MKD` |
//! | [`ftp::file_ops`] | `STOR`, `RETR`, `LIST` |
//! | [`ftp::parser`] | Unix `LIST` line parsing |

pub mod ftp;

pub use ftp::{
    FtpClient, FtpEntry, FtpEntryKind, FtpError, FtpErrorKind, FtpOptions, FtpResult, TransferPhase,
};

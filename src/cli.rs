//! Command-line interface definition.

use clap::{ArgAction, Args, Parser, Subcommand};
use srvcmd_core::{AuthMethod, Protocol};
use srvcmd_ftp::FtpOptions;
use std::path::PathBuf;

/// ServerCommander: stored sessions and FTP/FTPS transfers.
#[derive(Debug, Parser)]
#[command(name = "servercommander", version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory (defaults to $SERVERCOMMANDER_CONFIG_DIR or
    /// the user config dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage stored sessions
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Perform FTP/FTPS file operations
    Ftp {
        #[command(subcommand)]
        action: FtpCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List stored sessions
    List,

    /// Show one session in detail
    Show { alias: String },

    /// Add or replace a session
    Add {
        alias: String,

        /// ssh, sftp or ftp
        #[arg(long)]
        protocol: Protocol,

        #[arg(long)]
        host: String,

        /// Defaults to 22 for ssh/sftp and 21 for ftp
        #[arg(long)]
        port: Option<u16>,

        #[arg(long = "user")]
        username: String,

        /// password or private_key
        #[arg(long = "auth", default_value = "password")]
        auth_method: AuthMethod,

        /// Private key path (private_key auth)
        #[arg(long = "key")]
        key_path: Option<String>,

        /// Use explicit FTPS (AUTH TLS)
        #[arg(long = "tls")]
        use_tls: bool,

        /// Never prompt for a password when connecting
        #[arg(long)]
        no_password: bool,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a session
    Remove { alias: String },
}

#[derive(Debug, Subcommand)]
pub enum FtpCommand {
    /// List a remote directory
    List {
        alias: String,

        #[arg(default_value = ".")]
        remote_path: String,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        timeouts: TimeoutArgs,
    },

    /// Upload a local file; a remote path ending in '/' keeps the local name
    Upload {
        alias: String,
        local: PathBuf,
        remote: String,

        #[command(flatten)]
        timeouts: TimeoutArgs,
    },

    /// Download a remote file; a local path ending in a separator keeps the remote name
    Download {
        alias: String,
        remote: String,
        local: PathBuf,

        #[command(flatten)]
        timeouts: TimeoutArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct TimeoutArgs {
    /// Control connection dial timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub connect_timeout: u64,

    /// Data connection dial timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub data_timeout: u64,

    /// Give up when the server stalls for this many seconds (off by default)
    #[arg(long, value_name = "SECS")]
    pub io_timeout: Option<u64>,
}

impl From<&TimeoutArgs> for FtpOptions {
    fn from(t: &TimeoutArgs) -> Self {
        FtpOptions {
            connect_timeout_secs: t.connect_timeout,
            data_timeout_secs: t.data_timeout,
            io_timeout_secs: t.io_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ftp_upload_with_timeouts() {
        let cli = Cli::try_parse_from([
            "servercommander",
            "-vv",
            "ftp",
            "upload",
            "files",
            "report.csv",
            "/reports/",
            "--io-timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Ftp {
                action:
                    FtpCommand::Upload {
                        alias,
                        remote,
                        timeouts,
                        ..
                    },
            } => {
                assert_eq!(alias, "files");
                assert_eq!(remote, "/reports/");
                let opts = FtpOptions::from(&timeouts);
                assert_eq!(opts.connect_timeout_secs, 10);
                assert_eq!(opts.io_timeout_secs, Some(30));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn list_path_defaults_to_dot() {
        let cli = Cli::try_parse_from(["servercommander", "ftp", "list", "files"]).unwrap();
        match cli.command {
            Command::Ftp {
                action:
                    FtpCommand::List {
                        remote_path,
                        json,
                        ..
                    },
            } => {
                assert_eq!(remote_path, ".");
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn session_add_parses_protocol_and_auth() {
        let cli = Cli::try_parse_from([
            "servercommander",
            "session",
            "add",
            "box",
            "--protocol",
            "ftp",
            "--host",
            "10.0.0.5",
            "--user",
            "ops",
            "--auth",
            "private-key",
            "--tls",
        ])
        .unwrap();
        match cli.command {
            Command::Session {
                action:
                    SessionCommand::Add {
                        protocol,
                        auth_method,
                        use_tls,
                        port,
                        ..
                    },
            } => {
                assert_eq!(protocol, Protocol::Ftp);
                assert_eq!(auth_method, AuthMethod::PrivateKey);
                assert!(use_tls);
                assert_eq!(port, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let err = Cli::try_parse_from([
            "servercommander",
            "session",
            "add",
            "box",
            "--protocol",
            "gopher",
            "--host",
            "h",
            "--user",
            "u",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("gopher"));
    }
}

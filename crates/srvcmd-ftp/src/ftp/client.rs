//! Stateful FTP client: owns the control connection and issues commands.
//!
//! Lifecycle: `connect()` → greeting (220) → optional `AUTH TLS` upgrade →
//! `USER`/`PASS` → list / upload / download … → `close()`.
//!
//! One client is one control connection and at most one data connection at
//! a time. Every method takes `&mut self`, so two operations can never be
//! in flight on the same client.

use crate::ftp::connection;
use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::protocol::FtpCodec;
use crate::ftp::tls;
use crate::ftp::transfer::{self, DataStream, DataTls};
use crate::ftp::types::*;
use srvcmd_core::{Protocol, Session};

/// A connected, authenticated FTP session.
pub struct FtpClient {
    pub(crate) codec: FtpCodec,
    /// Set once `AUTH TLS` succeeds; reused for every data connection.
    pub(crate) data_tls: Option<DataTls>,
    pub(crate) options: FtpOptions,
    session: Session,
    welcome: String,
}

impl FtpClient {
    /// Connect and log in with default options.
    pub async fn connect(session: &Session, password: &str) -> FtpResult<Self> {
        Self::connect_with(session, password, FtpOptions::default()).await
    }

    /// Connect and log in.
    ///
    /// Nothing is left open on failure: the control socket (and any TLS
    /// state built on it) is dropped before the error is returned.
    pub async fn connect_with(
        session: &Session,
        password: &str,
        options: FtpOptions,
    ) -> FtpResult<Self> {
        if session.protocol != Protocol::Ftp {
            return Err(FtpError::invalid_config(format!(
                "session '{}' is not configured for FTP",
                session.alias
            )));
        }
        if session.host.is_empty() {
            return Err(FtpError::invalid_config("Host must not be empty"));
        }

        let addr = session.address();
        let (mut codec, banner) = connection::connect(&addr, &options).await?;

        // ── Explicit FTPS: AUTH TLS ──────────────────────────────
        let mut data_tls = None;
        if session.use_tls {
            codec
                .execute_expect("AUTH TLS", ReplyCodes::AUTH_TLS_ACCEPTED)
                .await
                .map_err(tls_refused)?;
            let config = tls::build_client_config()?;
            codec = tls::upgrade_to_tls(codec, config.clone(), &session.host).await?;
            data_tls = Some(DataTls {
                config,
                host: session.host.clone(),
            });
            log::debug!("control channel to {} upgraded to TLS", addr);
        }

        // ── Authenticate ─────────────────────────────────────────
        login(&mut codec, session, password).await?;
        log::debug!("logged in to {} as {}", addr, session.username);

        Ok(Self {
            codec,
            data_tls,
            options,
            session: session.clone(),
            welcome: banner.message(),
        })
    }

    /// Best-effort `QUIT`, then close the control connection.
    pub async fn close(mut self) -> FtpResult<()> {
        if let Err(e) = self.codec.execute("QUIT").await {
            log::debug!("QUIT failed, closing anyway: {}", e);
        }
        self.codec.close().await
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Greeting text sent by the server.
    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    pub fn is_tls(&self) -> bool {
        self.codec.is_tls()
    }

    pub fn options(&self) -> &FtpOptions {
        &self.options
    }

    /// Open one data connection scoped to `command` (`LIST`, `STOR`, `RETR`).
    pub(crate) async fn open_data_connection(&mut self, command: &str) -> FtpResult<DataStream> {
        transfer::open_data_connection(
            &mut self.codec,
            self.data_tls.as_ref(),
            command,
            self.options.data_timeout(),
        )
        .await
    }

    /// Read the 226/250 that ends a transfer.
    pub(crate) async fn read_transfer_complete(&mut self) -> FtpResult<FtpResponse> {
        self.codec.read_expect(ReplyCodes::TRANSFER_COMPLETE).await
    }
}

/// `USER`, then `PASS` unless the server already answered 230.
async fn login(codec: &mut FtpCodec, session: &Session, password: &str) -> FtpResult<()> {
    let command = format!("USER {}", session.username);
    let user = codec
        .execute_expect(&command, ReplyCodes::USER_ACCEPTED)
        .await
        .map_err(auth_on_530)?;
    if user.code == 230 {
        return Ok(());
    }

    if password.is_empty() {
        return Err(FtpError::auth_failed(format!(
            "password is required for FTP session '{}'",
            session.alias
        )));
    }

    codec
        .execute_expect(&format!("PASS {}", password), ReplyCodes::LOGGED_IN)
        .await
        .map_err(auth_on_530)?;
    Ok(())
}

/// Any coded reply to `AUTH TLS` other than 234 means the upgrade was refused.
fn tls_refused(e: FtpError) -> FtpError {
    match e.code {
        Some(code) => {
            FtpError::tls_failed(format!("AUTH TLS rejected: {}", e.message)).with_code(code)
        }
        None => e,
    }
}

/// 530 "Not logged in" means the credentials were refused.
fn auth_on_530(e: FtpError) -> FtpError {
    match e.code {
        Some(530) => FtpError::auth_failed(format!("Login failed: {}", e.message)).with_code(530),
        _ => e,
    }
}

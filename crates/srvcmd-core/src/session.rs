//! Stored connection profiles.
//!
//! A `Session` carries everything needed to reach a host except the secret:
//! passwords are prompted for at call time and never written to disk.

use crate::error::{SessionError, SessionResult};
use crate::paths::create_private_dir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ─── Protocol / AuthMethod ───────────────────────────────────────────

/// Remote access mechanism of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    Sftp,
    Ftp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Sftp => "sftp",
            Self::Ftp => "ftp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            "sftp" => Ok(Self::Sftp),
            "ftp" => Ok(Self::Ftp),
            other => Err(format!("unsupported protocol '{}'", other)),
        }
    }
}

/// How the user authenticates against the remote system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    Password,
    PrivateKey,
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "password" => Ok(Self::Password),
            "private_key" | "key" => Ok(Self::PrivateKey),
            other => Err(format!("unsupported auth method '{}'", other)),
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────────

/// Metadata for one remote connection. Deliberately has no password field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub alias: String,
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub requires_pass: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// A new session with the protocol's default port and password auth.
    pub fn new(
        alias: impl Into<String>,
        protocol: Protocol,
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            alias: alias.into(),
            protocol,
            host: host.into(),
            port: Self::default_port(protocol),
            username: username.into(),
            auth_method: AuthMethod::Password,
            key_path: None,
            use_tls: false,
            description: None,
            requires_pass: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn default_port(protocol: Protocol) -> u16 {
        match protocol {
            Protocol::Ssh | Protocol::Sftp => 22,
            Protocol::Ftp => 21,
        }
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// ─── SessionStore ────────────────────────────────────────────────────

/// The on-disk session registry, keyed by lower-cased alias.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sessions: BTreeMap<String, Session>,
}

fn null_as_empty<'de, D>(de: D) -> Result<BTreeMap<String, Session>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sessions = Option::<BTreeMap<String, Session>>::deserialize(de)?;
    Ok(sessions.unwrap_or_default())
}

impl SessionStore {
    /// Read the registry, returning an empty store when the file does not exist yet.
    pub fn load(path: &Path) -> SessionResult<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no session registry at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(SessionError::io(path, e)),
        };

        serde_json::from_slice(&data).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the registry as pretty JSON, owner read/write only.
    pub fn save(&self, path: &Path) -> SessionResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }

        let data = serde_json::to_vec_pretty(self).map_err(SessionError::Serialize)?;

        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(path).map_err(|e| SessionError::io(path, e))?;
        std::io::Write::write_all(&mut file, &data).map_err(|e| SessionError::io(path, e))?;
        let count = self.sessions.len();
        log::debug!("saved {} session(s) to {}", count, path.display());
        Ok(())
    }

    /// Insert or replace a session. The alias is normalised to lower case;
    /// `created_at` survives replacement.
    pub fn upsert(&mut self, mut session: Session) -> Session {
        let key = session.alias.to_lowercase();
        let now = Utc::now();
        session.alias = key.clone();
        session.created_at = match self.sessions.get(&key) {
            Some(existing) => existing.created_at,
            None => now,
        };
        session.updated_at = now;
        self.sessions.insert(key, session.clone());
        session
    }

    pub fn remove(&mut self, alias: &str) -> SessionResult<Session> {
        self.sessions
            .remove(&alias.to_lowercase())
            .ok_or_else(|| SessionError::NotFound(alias.to_string()))
    }

    pub fn get(&self, alias: &str) -> Option<&Session> {
        self.sessions.get(&alias.to_lowercase())
    }

    /// Sessions ordered by alias.
    pub fn list(&self) -> Vec<&Session> {
        self.sessions.values().collect()
    }
}

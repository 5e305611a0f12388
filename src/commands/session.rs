//! `servercommander session …`

use crate::cli::SessionCommand;
use anyhow::{bail, Context, Result};
use srvcmd_core::{AuthMethod, Protocol, Session, SessionStore};
use std::io::Write;
use std::path::Path;

pub fn run(action: SessionCommand, sessions_file: &Path, out: &mut impl Write) -> Result<()> {
    match action {
        SessionCommand::List => {
            let store = SessionStore::load(sessions_file)?;
            render_list(&store, out)
        }
        SessionCommand::Show { alias } => {
            let session = load_session(sessions_file, &alias)?;
            render_show(&session, out)
        }
        SessionCommand::Add {
            alias,
            protocol,
            host,
            port,
            username,
            auth_method,
            key_path,
            use_tls,
            no_password,
            description,
        } => {
            let session = build_session(NewSession {
                alias,
                protocol,
                host,
                port,
                username,
                auth_method,
                key_path,
                use_tls,
                no_password,
                description,
            })?;
            let mut store = SessionStore::load(sessions_file)?;
            let saved = store.upsert(session);
            store.save(sessions_file)?;
            tracing::info!(
                "session '{}' saved ({} {})",
                saved.alias,
                saved.protocol,
                saved.address()
            );
            writeln!(out, "Session '{}' saved.", saved.alias)?;
            Ok(())
        }
        SessionCommand::Remove { alias } => {
            let mut store = SessionStore::load(sessions_file)?;
            let removed = store.remove(&alias)?;
            store.save(sessions_file)?;
            tracing::info!("session '{}' removed", removed.alias);
            writeln!(out, "Session '{}' removed.", removed.alias)?;
            Ok(())
        }
    }
}

/// Look up `alias` in the registry at `sessions_file`.
pub fn load_session(sessions_file: &Path, alias: &str) -> Result<Session> {
    let store = SessionStore::load(sessions_file)?;
    store
        .get(alias)
        .cloned()
        .with_context(|| format!("session '{}' not found", alias))
}

/// Raw `session add` input.
pub struct NewSession {
    pub alias: String,
    pub protocol: Protocol,
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub auth_method: AuthMethod,
    pub key_path: Option<String>,
    pub use_tls: bool,
    pub no_password: bool,
    pub description: Option<String>,
}

/// Validate `session add` input and fill in protocol defaults.
///
/// FTP sessions always authenticate by password; key authentication needs a
/// key path; TLS is an FTP-only setting.
pub fn build_session(input: NewSession) -> Result<Session> {
    let alias = input.alias.trim();
    let host = input.host.trim();
    let username = input.username.trim();
    if alias.is_empty() {
        bail!("alias cannot be empty");
    }
    if host.is_empty() {
        bail!("host cannot be empty");
    }
    if username.is_empty() {
        bail!("username cannot be empty");
    }
    if input.port == Some(0) {
        bail!("invalid port: 0");
    }

    let auth_method = match input.protocol {
        Protocol::Ftp => AuthMethod::Password,
        _ => input.auth_method,
    };
    let key_path = match auth_method {
        AuthMethod::PrivateKey => match input.key_path.filter(|k| !k.trim().is_empty()) {
            Some(path) => Some(path),
            None => bail!(
                "private key path cannot be empty when using key authentication"
            ),
        },
        AuthMethod::Password => None,
    };

    let mut session = Session::new(alias, input.protocol, host, username);
    if let Some(port) = input.port {
        session.port = port;
    }
    session.auth_method = auth_method;
    session.key_path = key_path;
    session.use_tls = input.protocol == Protocol::Ftp && input.use_tls;
    session.requires_pass = auth_method == AuthMethod::Password && !input.no_password;
    session.description = input.description.filter(|d| !d.trim().is_empty());
    Ok(session)
}

fn auth_label(method: AuthMethod) -> &'static str {
    match method {
        AuthMethod::Password => "password",
        AuthMethod::PrivateKey => "private_key",
    }
}

pub fn render_list(store: &SessionStore, out: &mut impl Write) -> Result<()> {
    let sessions = store.list();
    if sessions.is_empty() {
        writeln!(out, "No sessions stored.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<15} {:<8} {:<25} {:<10} {:<10}",
        "ALIAS",
        "PROTOCOL",
        "HOST",
        "USER",
        "AUTH"
    )?;
    for s in sessions {
        writeln!(
            out,
            "{:<15} {:<8} {:<25} {:<10} {:<10}",
            s.alias,
            s.protocol,
            s.address(),
            s.username,
            auth_label(s.auth_method)
        )?;
    }
    Ok(())
}

pub fn render_show(s: &Session, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Alias:         {}", s.alias)?;
    writeln!(out, "Protocol:      {}", s.protocol)?;
    writeln!(out, "Host:          {}", s.address())?;
    writeln!(out, "Username:      {}", s.username)?;
    writeln!(out, "Auth Method:   {}", auth_label(s.auth_method))?;
    if let Some(key) = &s.key_path {
        writeln!(out, "Key Path:      {}", key)?;
    }
    if s.protocol == Protocol::Ftp {
        writeln!(out, "TLS Enabled:   {}", s.use_tls)?;
    }
    if let Some(desc) = &s.description {
        writeln!(out, "Description:   {}", desc)?;
    }
    writeln!(out, "Requires Pass: {}", s.requires_pass)?;
    writeln!(out, "Created:       {}", s.created_at.to_rfc3339())?;
    writeln!(out, "Updated:       {}", s.updated_at.to_rfc3339())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(protocol: Protocol) -> NewSession {
        NewSession {
            alias: "Files".into(),
            protocol,
            host: "files.internal".into(),
            port: None,
            username: "ops".into(),
            auth_method: AuthMethod::Password,
            key_path: None,
            use_tls: true,
            no_password: false,
            description: None,
        }
    }

    #[test]
    fn ftp_defaults() {
        let s = build_session(input(Protocol::Ftp)).unwrap();
        assert_eq!(s.port, 21);
        assert!(s.use_tls);
        assert!(s.requires_pass);
        assert_eq!(s.auth_method, AuthMethod::Password);
    }

    #[test]
    fn ftp_ignores_key_auth() {
        let mut i = input(Protocol::Ftp);
        i.auth_method = AuthMethod::PrivateKey;
        let s = build_session(i).unwrap();
        assert_eq!(s.auth_method, AuthMethod::Password);
        assert!(s.key_path.is_none());
    }

    #[test]
    fn tls_is_ftp_only() {
        let s = build_session(input(Protocol::Ssh)).unwrap();
        assert!(!s.use_tls);
        assert_eq!(s.port, 22);
    }

    #[test]
    fn key_auth_needs_a_path() {
        let mut i = input(Protocol::Sftp);
        i.auth_method = AuthMethod::PrivateKey;
        assert!(build_session(i).is_err());

        let mut i = input(Protocol::Sftp);
        i.auth_method = AuthMethod::PrivateKey;
        i.key_path = Some("~/.ssh/id_ed25519".into());
        let s = build_session(i).unwrap();
        assert!(!s.requires_pass);
        assert_eq!(s.key_path.as_deref(), Some("~/.ssh/id_ed25519"));
    }

    #[test]
    fn rejects_blank_fields() {
        let mut i = input(Protocol::Ftp);
        i.host = "  ".into();
        assert!(build_session(i).is_err());

        let mut i = input(Protocol::Ftp);
        i.port = Some(0);
        assert!(build_session(i).is_err());
    }

    #[test]
    fn add_show_remove_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sessions.json");
        let mut out = Vec::new();

        run(
            SessionCommand::Add {
                alias: "Files".into(),
                protocol: Protocol::Ftp,
                host: "10.0.0.9".into(),
                port: Some(2121),
                username: "ops".into(),
                auth_method: AuthMethod::Password,
                key_path: None,
                use_tls: false,
                no_password: true,
                description: Some("nightly drops".into()),
            },
            &file,
            &mut out,
        )
        .unwrap();

        out.clear();
        let show = SessionCommand::Show {
            alias: "FILES".into(),
        };
        run(show, &file, &mut out).unwrap();
        let shown = String::from_utf8(out.clone()).unwrap();
        assert!(shown.contains("Alias:         files"));
        assert!(shown.contains("Host:          10.0.0.9:2121"));
        assert!(shown.contains("TLS Enabled:   false"));
        assert!(shown.contains("Requires Pass: false"));

        out.clear();
        run(SessionCommand::List, &file, &mut out).unwrap();
        let listed = String::from_utf8(out.clone()).unwrap();
        assert!(listed.lines().nth(1).unwrap().starts_with("files"));

        out.clear();
        let remove = SessionCommand::Remove {
            alias: "files".into(),
        };
        run(remove, &file, &mut out).unwrap();
        assert!(load_session(&file, "files").is_err());

        out.clear();
        run(SessionCommand::List, &file, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No sessions stored.\n");
    }
}

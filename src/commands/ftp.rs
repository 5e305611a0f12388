//! `servercommander ftp …`
//!
//! Each command loads the session, obtains the password, connects, runs one
//! operation and closes the client whether or not the operation succeeded.

use crate::cli::{FtpCommand, TimeoutArgs};
use crate::commands::session::load_session;
use crate::prompt::password_for;
use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use srvcmd_core::Protocol;
use srvcmd_ftp::{FtpClient, FtpEntry, FtpOptions, FtpResult};
use std::io::Write;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

pub async fn run(action: FtpCommand, sessions_file: &Path, out: &mut impl Write) -> Result<()> {
    match action {
        FtpCommand::List {
            alias,
            remote_path,
            json,
            timeouts,
        } => {
            let mut client = connect(sessions_file, &alias, &timeouts).await?;
            let entries = finish(client.list(&remote_path).await, client).await?;
            render_listing(&entries, json, out)
        }
        FtpCommand::Upload {
            alias,
            local,
            remote,
            timeouts,
        } => {
            let remote = upload_target(&local, &remote);
            let mut client = connect(sessions_file, &alias, &timeouts).await?;
            let sent = finish(client.upload(&local, &remote).await, client).await?;
            writeln!(
                out,
                "Uploaded {} -> {} ({} bytes)",
                local.display(),
                remote,
                sent
            )?;
            Ok(())
        }
        FtpCommand::Download {
            alias,
            remote,
            local,
            timeouts,
        } => {
            let local = download_target(&remote, local)?;
            let mut client = connect(sessions_file, &alias, &timeouts).await?;
            let received = finish(client.download(&remote, &local).await, client).await?;
            writeln!(
                out,
                "Downloaded {} -> {} ({} bytes)",
                remote,
                local.display(),
                received
            )?;
            Ok(())
        }
    }
}

async fn connect(sessions_file: &Path, alias: &str, timeouts: &TimeoutArgs) -> Result<FtpClient> {
    let session = load_session(sessions_file, alias)?;
    if session.protocol != Protocol::Ftp {
        bail!("session '{}' is not configured for FTP", session.alias);
    }
    let password = password_for(&session)?;
    let target = format!("'{}' ({})", session.alias, session.address());
    let client = FtpClient::connect_with(&session, &password, FtpOptions::from(timeouts))
        .await
        .with_context(|| format!("FTP connection to {} failed", target))?;
    tracing::info!(
        "connected to '{}' at {}{}",
        session.alias,
        session.address(),
        if client.is_tls() { " (TLS)" } else { "" }
    );
    Ok(client)
}

/// Close `client`, then hand back the operation's own result. A failed
/// close never masks the operation's outcome.
async fn finish<T>(result: FtpResult<T>, client: FtpClient) -> Result<T> {
    if let Err(e) = client.close().await {
        tracing::debug!("closing FTP connection: {}", e);
    }
    Ok(result?)
}

/// A remote target ending in `/` names a directory: keep the local file name.
pub fn upload_target(local: &Path, remote: &str) -> String {
    if !remote.ends_with('/') {
        return remote.to_string();
    }
    match local.file_name() {
        Some(name) => format!("{}{}", remote, name.to_string_lossy()),
        None => remote.to_string(),
    }
}

/// A local target ending in the path separator names a directory: keep the
/// remote file name.
pub fn download_target(remote: &str, local: PathBuf) -> Result<PathBuf> {
    let is_dir = {
        let s = local.as_os_str().to_string_lossy();
        s.ends_with(MAIN_SEPARATOR) || s.ends_with('/')
    };
    if !is_dir {
        return Ok(local);
    }
    match remote.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(local.join(name)),
        _ => bail!("cannot derive a local file name from '{}'", remote),
    }
}

pub fn render_listing(entries: &[FtpEntry], json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, entries)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:<30} {:<12} {:<20}", "NAME", "SIZE", "MODIFIED")?;
    for entry in entries {
        let mut name = entry.name.clone();
        if entry.is_dir() {
            name.push('/');
        }
        let modified = entry
            .modified
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        writeln!(out, "{:<30} {:<12} {:<20}", name, entry.size, modified)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use srvcmd_ftp::ftp::parser::parse_list_line_at;

    #[test]
    fn upload_target_appends_local_name_to_directories() {
        let local = Path::new("/home/ops/local.txt");
        assert_eq!(upload_target(local, "/reports/"), "/reports/local.txt");
        assert_eq!(upload_target(local, "/"), "/local.txt");
        let file = "/reports/final.txt";
        assert_eq!(upload_target(local, file), file);
    }

    #[test]
    fn download_target_appends_remote_name_to_directories() {
        let dir = format!("downloads{}", MAIN_SEPARATOR);
        assert_eq!(
            download_target("/pub/notes.txt", PathBuf::from(&dir)).unwrap(),
            Path::new("downloads").join("notes.txt")
        );
        assert_eq!(
            download_target("/pub/notes.txt", PathBuf::from("copy.txt")).unwrap(),
            PathBuf::from("copy.txt")
        );
        assert!(download_target("/", PathBuf::from(&dir)).is_err());
    }

    fn sample() -> Vec<FtpEntry> {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        vec![
            parse_list_line_at("-rw-r--r-- 1 user group 1024 Jan 5 12:30 notes.txt", now),
            parse_list_line_at("drwxr-xr-x 2 user group 4096 Mar 1 2024 archive", now),
            parse_list_line_at("total 8", now),
        ]
    }

    #[test]
    fn table_rendering() {
        let mut out = Vec::new();
        render_listing(&sample(), false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("notes.txt "));
        assert!(lines[1].contains("1024"));
        assert!(lines[1].ends_with("2026-01-05T12:30:00Z"));
        assert!(lines[2].starts_with("archive/ "));
        assert!(lines[3].starts_with("total 8"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn json_rendering() {
        let mut out = Vec::new();
        render_listing(&sample(), true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[0]["name"], "notes.txt");
        assert_eq!(arr[0]["size"], 1024);
        assert_eq!(arr[1]["kind"], "directory");
        assert!(arr[2]["modified"].is_null());
    }
}

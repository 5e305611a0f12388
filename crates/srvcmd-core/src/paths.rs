//! Configuration directory layout.
//!
//! ```text
//! <config root>/
//!   sessions.json
//!   logs/
//!     servercommander.log
//! ```
//!
//! The root is `$SERVERCOMMANDER_CONFIG_DIR` when set, otherwise
//! `<user config dir>/servercommander`.

use crate::error::{SessionError, SessionResult};
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration root.
pub const CONFIG_DIR_ENV: &str = "SERVERCOMMANDER_CONFIG_DIR";

const APP_DIR: &str = "servercommander";
const SESSIONS_FILE: &str = "sessions.json";
const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "servercommander.log";

/// Resolve (and create if required) the configuration root.
pub fn config_root() -> SessionResult<PathBuf> {
    let root = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .ok_or(SessionError::ConfigDir)?
            .join(APP_DIR),
    };
    create_private_dir(&root)?;
    Ok(root)
}

pub fn sessions_file(root: &Path) -> PathBuf {
    root.join(SESSIONS_FILE)
}

pub fn log_dir(root: &Path) -> PathBuf {
    root.join(LOG_DIR)
}

/// Append-only operation log.
pub fn log_file(root: &Path) -> PathBuf {
    log_dir(root).join(LOG_FILE)
}

/// Create `dir` and any missing parents, owner-only on Unix.
pub fn create_private_dir(dir: &Path) -> SessionResult<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| SessionError::io(dir, e))
}

//! Errors raised by the session registry and config-path helpers.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unable to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid sessions file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialise sessions: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("failed to resolve user config directory")]
    ConfigDir,
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

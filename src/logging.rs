//! Tracing subscriber setup.
//!
//! Two layers:
//! - stderr, filtered by `RUST_LOG` or the `-v` count
//! - the operation log under the config root, `info` and above, no colours
//!
//! `log` records from the library crates reach both through the
//! `tracing-log` bridge installed by `try_init`.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default stderr filter for a given number of `-v` flags.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(verbosity: u8, log_file: Option<&Path>) {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_filter);

    let (file_layer, file_error) = match log_file.map(|p| (p, open_append(p))) {
        Some((_, Ok(file))) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_timer(ChronoUtc::rfc_3339())
                .with_filter(LevelFilter::INFO);
            (Some(layer), None)
        }
        Some((path, Err(e))) => (None, Some(format!("{}: {}", path.display(), e))),
        None => (None, None),
    };

    if tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        return;
    }

    if let Some(err) = file_error {
        tracing::warn!("file logging disabled, unable to open {}", err);
    }
}

/// Open (creating if needed) the log file for appending, owner-only on Unix.
fn open_append(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut opts = OpenOptions::new();
    opts.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

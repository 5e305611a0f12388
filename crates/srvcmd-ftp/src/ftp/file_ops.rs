//! File-level operations: upload (STOR), download (RETR), listing (LIST).
//!
//! Every failure is tagged with the `TransferPhase` it happened in. A data
//! connection never outlives the call that opened it.

use crate::ftp::client::FtpClient;
use crate::ftp::directory::remote_parent;
use crate::ftp::error::{FtpError, FtpResult, TransferPhase};
use crate::ftp::parser::parse_list_line;
use crate::ftp::protocol::bounded;
use crate::ftp::transfer::DataStream;
use crate::ftp::types::FtpEntry;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Default chunk size for streaming transfers (64 KiB).
const DEFAULT_CHUNK: usize = 65_536;

impl FtpClient {
    // ─── UPLOAD (STOR) ───────────────────────────────────────────

    /// Upload a local file, creating missing remote parent directories first.
    ///
    /// Returns the number of bytes sent.
    pub async fn upload(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
    ) -> FtpResult<u64> {
        let local_path = local_path.as_ref();

        let mut file = match fs::File::open(local_path).await {
            Ok(file) => file,
            Err(e) => {
                let err = FtpError::local_io("open", local_path, e);
                return Err(err.in_phase(TransferPhase::Open));
            }
        };

        self.ensure_remote_dir(remote_parent(remote_path))
            .await
            .map_err(|e| e.in_phase(TransferPhase::EnsureDir))?;

        let mut data = self
            .open_data_connection(&format!("STOR {}", remote_path))
            .await
            .map_err(|e| e.in_phase(TransferPhase::Dial))?;

        let started = Instant::now();
        let limit = self.options.io_timeout();
        let sent = pump(&mut file, &mut data, limit, false)
            .await
            .map_err(|e| e.into_error(local_path, true))?;

        // FIN (and close_notify over TLS) tells the server the file is complete.
        let close = async { data.shutdown().await.map_err(FtpError::from) };
        bounded(limit, "data close", close)
            .await
            .map_err(|e| e.in_phase(TransferPhase::Copy))?;
        drop(data);

        self.read_transfer_complete()
            .await
            .map_err(|e| e.in_phase(TransferPhase::Finalize))?;

        log::info!(
            "uploaded {} -> {} ({} bytes in {:?})",
            local_path.display(),
            remote_path,
            sent,
            started.elapsed()
        );
        Ok(sent)
    }

    // ─── DOWNLOAD (RETR) ─────────────────────────────────────────

    /// Download a remote file, creating local parent directories (`0700`)
    /// and the file itself (`0600`, truncated) as needed.
    ///
    /// Returns the number of bytes received.
    pub async fn download(
        &mut self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
    ) -> FtpResult<u64> {
        let local_path = local_path.as_ref();

        let mut data = self
            .open_data_connection(&format!("RETR {}", remote_path))
            .await
            .map_err(|e| e.in_phase(TransferPhase::Dial))?;

        let mut file = create_local_file(local_path)
            .await
            .map_err(|e| e.in_phase(TransferPhase::Open))?;

        let started = Instant::now();
        let tls = data.is_tls();
        let received = pump(&mut data, &mut file, self.options.io_timeout(), tls)
            .await
            .map_err(|e| e.into_error(local_path, false))?;
        drop(data);
        drop(file);

        self.read_transfer_complete()
            .await
            .map_err(|e| e.in_phase(TransferPhase::Finalize))?;

        log::info!(
            "downloaded {} -> {} ({} bytes in {:?})",
            remote_path,
            local_path.display(),
            received,
            started.elapsed()
        );
        Ok(received)
    }

    // ─── LIST ────────────────────────────────────────────────────

    /// List a remote directory. An empty `path` lists the server's
    /// current directory.
    ///
    /// Every line the server sends becomes one entry, in order.
    pub async fn list(&mut self, path: &str) -> FtpResult<Vec<FtpEntry>> {
        let command = if path.is_empty() {
            "LIST".to_string()
        } else {
            format!("LIST {}", path)
        };

        let data = self
            .open_data_connection(&command)
            .await
            .map_err(|e| e.in_phase(TransferPhase::Dial))?;

        let entries = read_listing(data, self.options.io_timeout())
            .await
            .map_err(|e| e.in_phase(TransferPhase::Copy))?;

        self.read_transfer_complete()
            .await
            .map_err(|e| e.in_phase(TransferPhase::Finalize))?;

        log::debug!("LIST {}: {} entries", path, entries.len());
        Ok(entries)
    }
}

/// Drain the listing connection line by line, parsing as we go.
async fn read_listing(data: DataStream, limit: Option<Duration>) -> FtpResult<Vec<FtpEntry>> {
    let tls = data.is_tls();
    let mut reader = BufReader::new(data);
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = bounded(limit, "data read", async {
            match reader.read_until(b'\n', &mut buf).await {
                Ok(n) => Ok(n),
                // Servers often drop a TLS data socket without close_notify;
                // the 226/250 on the control channel confirms completion.
                Err(e) if tls && e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
                Err(e) => Err(FtpError::from(e)),
            }
        })
        .await?;
        if n == 0 && buf.is_empty() {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        entries.push(parse_list_line(line.trim_end_matches(['\r', '\n'])));
        if n == 0 {
            break;
        }
    }
    Ok(entries)
}

async fn create_local_file(path: &Path) -> FtpResult<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder
            .create(parent)
            .await
            .map_err(|e| FtpError::local_io("create directory", parent, e))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    options
        .open(path)
        .await
        .map_err(|e| FtpError::local_io("create", path, e))
}

// ─── Streaming copy ──────────────────────────────────────────────────

/// Which end of a copy failed.
#[derive(Debug)]
enum CopyFailure {
    /// Reading the source (local file on upload, socket on download).
    Source(io::Error),
    /// Writing the sink (socket on upload, local file on download).
    Sink(io::Error),
    Timeout(Duration),
}

impl CopyFailure {
    /// Attribute the failure to the local file or the network, tagged with
    /// the `Copy` phase.
    ///
    /// `local_is_source` is true for uploads (the file is read) and false
    /// for downloads (the file is written).
    fn into_error(self, local_path: &Path, local_is_source: bool) -> FtpError {
        let local_action = if local_is_source { "read" } else { "write" };
        let err = match self {
            Self::Timeout(d) => {
                FtpError::timeout(format!("data transfer stalled for {}s", d.as_secs()))
            }
            Self::Source(e) if local_is_source => FtpError::local_io(local_action, local_path, e),
            Self::Sink(e) if !local_is_source => FtpError::local_io(local_action, local_path, e),
            Self::Source(e) | Self::Sink(e) => e.into(),
        };
        err.in_phase(TransferPhase::Copy)
    }
}

/// Copy `src` into `dst` in `DEFAULT_CHUNK` pieces, each read and write
/// bounded by `limit`. With `eof_is_end`, an `UnexpectedEof` from the
/// source ends the copy instead of failing it.
async fn pump<R, W>(
    src: &mut R,
    dst: &mut W,
    limit: Option<Duration>,
    eof_is_end: bool,
) -> Result<u64, CopyFailure>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DEFAULT_CHUNK];
    let mut total = 0u64;

    loop {
        let n = match with_limit(limit, src.read(&mut buf)).await? {
            Ok(n) => n,
            Err(e) if eof_is_end && e.kind() == io::ErrorKind::UnexpectedEof => {
                log::debug!(
                    "data connection closed without close_notify after {} bytes",
                    total
                );
                0
            }
            Err(e) => return Err(CopyFailure::Source(e)),
        };
        if n == 0 {
            break;
        }
        with_limit(limit, dst.write_all(&buf[..n]))
            .await?
            .map_err(CopyFailure::Sink)?;
        total += n as u64;
    }

    with_limit(limit, dst.flush())
        .await?
        .map_err(CopyFailure::Sink)?;
    Ok(total)
}

async fn with_limit<T, F>(limit: Option<Duration>, fut: F) -> Result<io::Result<T>, CopyFailure>
where
    F: std::future::Future<Output = io::Result<T>>,
{
    match limit {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| CopyFailure::Timeout(d)),
        None => Ok(fut.await),
    }
}

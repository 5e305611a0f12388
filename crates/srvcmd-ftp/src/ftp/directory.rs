//! Remote directory creation.

use crate::ftp::client::FtpClient;
use crate::ftp::error::FtpResult;
use crate::ftp::types::ReplyCodes;

impl FtpClient {
    /// Create `dir` and every missing ancestor, one `MKD` per segment.
    ///
    /// `/a/b/c` issues `MKD /a`, `MKD /a/b`, `MKD /a/b/c`; a relative path
    /// stays relative (`a/b` issues `MKD a`, `MKD a/b`) and is resolved by
    /// the server against the login directory; it is not forced under `/`
    /// the way older ServerCommander releases did. Both 257 and 550
    /// count as success, because servers answer 550 for "already exists".
    /// A 550 that actually means "permission denied" therefore passes here
    /// and surfaces later, when the transfer itself is refused.
    pub async fn ensure_remote_dir(&mut self, dir: &str) -> FtpResult<()> {
        if dir.is_empty() || dir == "." || dir == "/" {
            return Ok(());
        }

        let absolute = dir.starts_with('/');
        let mut current = String::with_capacity(dir.len());
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            if absolute || !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);

            let command = format!("MKD {}", current);
            let resp = self
                .codec
                .execute_expect(&command, ReplyCodes::DIRECTORY_CREATED_OR_EXISTS)
                .await?;
            if resp.code == 550 {
                log::debug!("MKD {}: {} (treated as existing)", current, resp.message());
            }
        }
        Ok(())
    }
}

/// Directory part of a remote path, `/`-separated regardless of platform.
///
/// `"/a/b/f.txt"` → `"/a/b"`, `"/f.txt"` → `"/"`, `"f.txt"` → `"."`.
pub fn remote_parent(path: &str) -> &str {
    match path.rfind('/') {
        None => ".",
        Some(0) => "/",
        Some(i) => {
            let dir = path[..i].trim_end_matches('/');
            if dir.is_empty() {
                "/"
            } else {
                dir
            }
        }
    }
}

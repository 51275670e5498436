//! Size-based rotation of `app.log`.
//!
//! Runs once at startup, before the sink opens the file. When the live log
//! has reached [`MAX_LOG_BYTES`] it is shifted to `app.log.1`, older copies
//! move up by one and anything past [`MAX_ROTATED_FILES`] is dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum log file size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated copies kept next to the live log.
pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` if it is at least `max_bytes` long.
///
/// Returns `true` if rotation happened. A missing log is not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes || max_files == 0 {
        return Ok(false);
    }

    remove_if_present(&numbered_path(log_path, max_files))?;
    for n in (1..max_files).rev() {
        let from = numbered_path(log_path, n);
        if from.exists() {
            fs::rename(&from, numbered_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

/// Rotate `<home>/.packmirror/logs/app.log` with the default limits.
pub fn rotate_app_log(home: &Path) -> io::Result<bool> {
    rotate_if_needed(
        &crate::paths::app_log_path(home),
        MAX_LOG_BYTES,
        MAX_ROTATED_FILES,
    )
}

/// `app.log` → `app.log.<n>`.
pub fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::paths::APP_LOG.to_string());
    base.with_file_name(format!("{name}.{n}"))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

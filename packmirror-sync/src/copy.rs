//! Single-file copy.
//!
//! Steps, each failing only this file:
//! 1. Open the source for reading.
//! 2. Create the destination's parent directories (idempotent, safe to race).
//! 3. Create/truncate the destination and copy every byte.
//! 4. `sync_all` the destination before reporting success.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use crate::error::SyncError;

/// One leaf copy produced by the tree walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Copy `job.source` over `job.dest`, returning the number of bytes written.
pub fn copy_file(job: &CopyJob) -> Result<u64, SyncError> {
    let mut input = File::open(&job.source).map_err(|source| SyncError::OpenSource {
        path: job.source.clone(),
        source,
    })?;

    if let Some(parent) = job.dest.parent() {
        fs::create_dir_all(parent).map_err(|source| SyncError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut output = File::create(&job.dest).map_err(|source| SyncError::CreateDest {
        path: job.dest.clone(),
        source,
    })?;

    let bytes = io::copy(&mut input, &mut output).map_err(|source| SyncError::Copy {
        from: job.source.clone(),
        to: job.dest.clone(),
        source,
    })?;

    output.sync_all().map_err(|source| SyncError::Sync {
        path: job.dest.clone(),
        source,
    })?;

    tracing::debug!(
        from = %job.source.display(),
        to = %job.dest.display(),
        bytes,
        "file copied",
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(root: &TempDir, src: &str, dst: &str) -> CopyJob {
        CopyJob {
            source: root.path().join(src),
            dest: root.path().join(dst),
        }
    }

    #[test]
    fn copies_bytes_and_creates_parents() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("in.bin"), [0u8, 1, 2, 255]).unwrap();
        let job = job(&root, "in.bin", "out/deep/nested/in.bin");

        let bytes = copy_file(&job).unwrap();
        assert_eq!(bytes, 4);
        assert_eq!(fs::read(&job.dest).unwrap(), vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn truncates_longer_existing_destination() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("src.txt"), "short").unwrap();
        fs::write(root.path().join("dst.txt"), "a much longer stale body").unwrap();

        copy_file(&job(&root, "src.txt", "dst.txt")).unwrap();
        assert_eq!(fs::read_to_string(root.path().join("dst.txt")).unwrap(), "short");
    }

    #[test]
    fn missing_source_is_open_error_and_creates_nothing() {
        let root = TempDir::new().unwrap();
        let job = job(&root, "absent.txt", "out/absent.txt");
        let err = copy_file(&job).unwrap_err();
        assert!(matches!(err, SyncError::OpenSource { .. }), "got: {err}");
        assert!(!root.path().join("out").exists());
    }

    #[test]
    fn parent_blocked_by_file_is_create_dir_error() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("src.txt"), "x").unwrap();
        fs::write(root.path().join("blocker"), "i am a file").unwrap();

        let err = copy_file(&job(&root, "src.txt", "blocker/src.txt")).unwrap_err();
        assert!(matches!(err, SyncError::CreateDir { .. }), "got: {err}");
    }

    #[test]
    fn existing_parent_directory_is_not_an_error() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("src.txt"), "x").unwrap();
        fs::create_dir_all(root.path().join("out")).unwrap();
        copy_file(&job(&root, "src.txt", "out/src.txt")).unwrap();
        copy_file(&job(&root, "src.txt", "out/src.txt")).unwrap();
    }
}

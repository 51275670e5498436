//! Lazy depth-first walk of a source tree.
//!
//! [`TreeWalk`] yields one [`CopyJob`] per non-directory entry, mapping each
//! source path to the same relative path under the destination root. Only
//! directories are descended into; symlinks and special files are handed to
//! the copy step as-is. A directory that cannot be listed yields a single
//! [`SyncError::ReadDir`] and its subtree is skipped.

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use crate::copy::CopyJob;
use crate::error::SyncError;

struct Frame {
    entries: ReadDir,
    source: PathBuf,
    dest: PathBuf,
}

pub struct TreeWalk {
    root: Option<(PathBuf, PathBuf)>,
    stack: Vec<Frame>,
}

impl TreeWalk {
    /// No I/O happens until the first call to `next`.
    pub fn new(source_root: &Path, dest_root: &Path) -> Self {
        Self {
            root: Some((source_root.to_path_buf(), dest_root.to_path_buf())),
            stack: Vec::new(),
        }
    }

    fn descend(&mut self, source: PathBuf, dest: PathBuf) -> Result<(), SyncError> {
        let entries = fs::read_dir(&source).map_err(|e| SyncError::ReadDir {
            path: source.clone(),
            source: e,
        })?;
        self.stack.push(Frame {
            entries,
            source,
            dest,
        });
        Ok(())
    }
}

enum Step {
    Exhausted,
    Failed(SyncError),
    Entry { source: PathBuf, dest: PathBuf, is_dir: bool },
}

impl Iterator for TreeWalk {
    type Item = Result<CopyJob, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((source, dest)) = self.root.take() {
            if let Err(err) = self.descend(source, dest) {
                return Some(Err(err));
            }
        }

        loop {
            let step = {
                let frame = self.stack.last_mut()?;
                match frame.entries.next() {
                    None => Step::Exhausted,
                    Some(Err(e)) => Step::Failed(SyncError::ReadDir {
                        path: frame.source.clone(),
                        source: e,
                    }),
                    Some(Ok(entry)) => {
                        let source = entry.path();
                        match entry.file_type() {
                            Ok(ty) => Step::Entry {
                                dest: frame.dest.join(entry.file_name()),
                                source,
                                is_dir: ty.is_dir(),
                            },
                            Err(e) => Step::Failed(SyncError::ReadDir { path: source, source: e }),
                        }
                    }
                }
            };

            match step {
                Step::Exhausted => {
                    self.stack.pop();
                }
                Step::Failed(err) => return Some(Err(err)),
                Step::Entry { source, dest, is_dir: true } => {
                    if let Err(err) = self.descend(source, dest) {
                        return Some(Err(err));
                    }
                }
                Step::Entry { source, dest, is_dir: false } => {
                    return Some(Ok(CopyJob { source, dest }));
                }
            }
        }
    }
}

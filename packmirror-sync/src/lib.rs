//! # packmirror-sync
//!
//! Full-tree mirroring.
//!
//! Call [`mirror`] to copy every file under a source root onto a destination
//! root. Directory traversal runs on one blocking thread and feeds copy jobs
//! to a task group; the call returns once every job has finished.

pub mod blocking;
pub mod copy;
pub mod error;
pub mod mirror;
pub mod walk;

pub use copy::{copy_file, CopyJob};
pub use error::SyncError;
pub use mirror::{mirror, mirror_pair, MirrorOptions, MirrorReport};
pub use walk::TreeWalk;

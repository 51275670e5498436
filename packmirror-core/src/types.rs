//! Domain types shared by the mirror, the liveness gate and the controller.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Process name watched when no target executable is configured.
pub const DEFAULT_TARGET_PROCESS: &str = "GTA5.exe";

// ---------------------------------------------------------------------------
// Mirror pairs
// ---------------------------------------------------------------------------

/// Which configured mapping a [`MirrorPair`] came from. Order of the variants
/// is the order pairs are mirrored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairLabel {
    Gunpack,
    Redux,
    Backup,
}

impl fmt::Display for PairLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairLabel::Gunpack => write!(f, "gunpack"),
            PairLabel::Redux => write!(f, "redux"),
            PairLabel::Backup => write!(f, "backup"),
        }
    }
}

/// A source tree copied wholesale onto a destination tree each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPair {
    pub label: PairLabel,
    pub source_root: PathBuf,
    /// Created on demand, including intermediate directories.
    pub dest_root: PathBuf,
}

impl MirrorPair {
    pub fn new(
        label: PairLabel,
        source_root: impl Into<PathBuf>,
        dest_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label,
            source_root: source_root.into(),
            dest_root: dest_root.into(),
        }
    }
}

impl fmt::Display for MirrorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.label,
            self.source_root.display(),
            self.dest_root.display()
        )
    }
}

// ---------------------------------------------------------------------------
// Process target
// ---------------------------------------------------------------------------

/// The application whose presence pauses mirroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTarget {
    pub process_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<PathBuf>,
}

impl ProcessTarget {
    pub fn new(process_name: impl Into<String>, full_path: Option<PathBuf>) -> Self {
        Self {
            process_name: process_name.into(),
            full_path,
        }
    }

    /// Build a target from an optional executable path. The process name is the
    /// executable's file name, or [`DEFAULT_TARGET_PROCESS`] when absent.
    pub fn from_executable(executable: Option<&Path>) -> Self {
        let process_name = executable
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_TARGET_PROCESS.to_string());
        Self {
            process_name,
            full_path: executable.map(Path::to_path_buf),
        }
    }
}

impl fmt::Display for ProcessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.full_path {
            Some(path) => write!(f, "{} ({})", self.process_name, path.display()),
            None => self.process_name.fmt(f),
        }
    }
}

/// Case-insensitive process-name equality.
pub fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_name_defaults_when_no_executable() {
        let target = ProcessTarget::from_executable(None);
        assert_eq!(target.process_name, DEFAULT_TARGET_PROCESS);
        assert!(target.full_path.is_none());
    }

    #[test]
    fn target_name_taken_from_executable_file_name() {
        let exe = PathBuf::from("/games/rockstar/PlayGTAV.exe");
        let target = ProcessTarget::from_executable(Some(&exe));
        assert_eq!(target.process_name, "PlayGTAV.exe");
        assert_eq!(target.full_path.as_deref(), Some(exe.as_path()));
    }

    #[test]
    fn name_match_ignores_case() {
        assert!(names_equal("GTA5.exe", "gta5.EXE"));
        assert!(!names_equal("GTA5.exe", "GTA5.exe.bak"));
    }

    #[test]
    fn name_match_folds_non_ascii() {
        assert!(names_equal("Игра.exe", "игра.EXE"));
    }

    #[test]
    fn pair_label_display() {
        assert_eq!(PairLabel::Gunpack.to_string(), "gunpack");
        assert_eq!(PairLabel::Backup.to_string(), "backup");
    }

    #[test]
    fn pair_display_shows_both_roots() {
        let pair = MirrorPair::new(PairLabel::Redux, "/a", "/b");
        assert_eq!(pair.to_string(), "redux: /a -> /b");
    }
}

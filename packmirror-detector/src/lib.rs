//! Target-process liveness for `packmirror-detector`.
//!
//! [`Liveness`] answers "is the target application running?" by combining a
//! case-insensitive name match over a process snapshot with a query for the
//! exact executable path. Both checks go through a [`ProcessObserver`], one
//! implementation per platform (see [`observer`]).
//!
//! Neither check ever blocks the caller on an unobservable condition: any
//! observer failure is logged and reported as "not running".

pub mod observer;

use std::path::{Path, PathBuf};

use packmirror_core::types::{names_equal, ProcessTarget};
use thiserror::Error;

pub use observer::{platform_observer, PlatformObserver};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Column header printed by the path query before any result rows.
pub const PATH_QUERY_HEADER: &str = "ProcessId";

/// Errors from process enumeration.
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("process enumeration is not supported on this platform")]
    Unsupported,
}

/// Capability to observe running processes on the host.
pub trait ProcessObserver: Send + Sync {
    /// Names of every process currently running.
    fn process_names(&self) -> Result<Vec<String>, LivenessError>;

    /// Raw output rows of a query for processes whose executable is exactly
    /// `executable`. Rows may include a [`PATH_QUERY_HEADER`] line and blanks.
    fn query_by_path(&self, executable: &Path) -> Result<Vec<String>, LivenessError>;
}

impl<T: ProcessObserver + ?Sized> ProcessObserver for std::sync::Arc<T> {
    fn process_names(&self) -> Result<Vec<String>, LivenessError> {
        (**self).process_names()
    }

    fn query_by_path(&self, executable: &Path) -> Result<Vec<String>, LivenessError> {
        (**self).query_by_path(executable)
    }
}

/// Outcome of probing both checks independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub by_name: bool,
    /// `None` when the target has no configured executable path.
    pub by_path: Option<bool>,
}

impl Probe {
    pub fn running(&self) -> bool {
        self.by_name || self.by_path.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Liveness gate
// ---------------------------------------------------------------------------

/// The combined by-name / by-path gate.
#[derive(Debug, Clone)]
pub struct Liveness<O> {
    observer: O,
}

impl<O: ProcessObserver> Liveness<O> {
    pub fn new(observer: O) -> Self {
        Self { observer }
    }

    /// True if any running process is named `name`, ignoring case.
    /// Fails open: a snapshot error is logged and yields `false`.
    pub fn is_running_by_name(&self, name: &str) -> bool {
        match self.observer.process_names() {
            Ok(names) => names.iter().any(|candidate| names_equal(candidate, name)),
            Err(err) => {
                tracing::warn!(process = name, error = %err, "failed to list running processes");
                false
            }
        }
    }

    /// True iff the path query returns at least one result row.
    /// A query error is logged and yields `false`.
    pub fn is_running_by_path(&self, executable: &Path) -> bool {
        match self.observer.query_by_path(executable) {
            Ok(rows) => count_result_rows(&rows) > 0,
            Err(err) => {
                tracing::warn!(
                    path = %executable.display(),
                    error = %err,
                    "failed to query processes by executable path",
                );
                false
            }
        }
    }

    /// `by_name(target.process_name) || by_path(target.full_path)`.
    /// The path query is skipped when the name already matched.
    pub fn is_target_running(&self, target: &ProcessTarget) -> bool {
        if self.is_running_by_name(&target.process_name) {
            return true;
        }
        target
            .full_path
            .as_deref()
            .map(|path| self.is_running_by_path(path))
            .unwrap_or(false)
    }

    /// Run both checks without short-circuiting.
    pub fn probe(&self, target: &ProcessTarget) -> Probe {
        Probe {
            by_name: self.is_running_by_name(&target.process_name),
            by_path: target
                .full_path
                .as_deref()
                .map(|path| self.is_running_by_path(path)),
        }
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// Count rows that are neither blank nor the [`PATH_QUERY_HEADER`].
pub fn count_result_rows<S: AsRef<str>>(rows: &[S]) -> usize {
    rows.iter()
        .map(|row| row.as_ref().trim())
        .filter(|row| !row.is_empty() && !row.eq_ignore_ascii_case(PATH_QUERY_HEADER))
        .count()
}

/// Image names from `tasklist /FO CSV /NH` output: the first quoted field of
/// every non-empty line.
pub fn parse_tasklist_csv(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let field = match line.strip_prefix('"') {
                Some(rest) => rest.split('"').next().unwrap_or(rest),
                None => line.split(',').next().unwrap_or(line),
            };
            let field = field.trim();
            if field.is_empty() {
                None
            } else {
                Some(field.to_string())
            }
        })
        .collect()
}

/// Process names from `ps -A -o comm=` output. Some platforms print the full
/// executable path in `comm`, so the file-name component is recorded as well.
pub fn parse_ps_names(output: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        names.push(line.to_string());
        if let Some(base) = executable_basename(line) {
            if base != line {
                names.push(base.to_string());
            }
        }
    }
    names
}

/// Last component of an executable path written with `/` or `\` separators,
/// as found in `argv[0]` of native and Wine processes.
pub fn executable_basename(path: &str) -> Option<&str> {
    path.trim()
        .rsplit(&['/', '\\'][..])
        .next()
        .filter(|base| !base.is_empty())
}

/// Escape an executable path for a WQL `ExecutablePath='…'` clause.
pub fn escape_wql_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_ignore_header_and_blanks() {
        assert_eq!(count_result_rows(&["ProcessId  ", "", "   "]), 0);
        assert_eq!(count_result_rows(&["ProcessId", "4242", ""]), 1);
        assert_eq!(count_result_rows(&["processid", "1", "2"]), 2);
    }

    #[test]
    fn tasklist_csv_takes_first_field() {
        let out = "\"System Idle Process\",\"0\",\"Services\",\"0\",\"8 K\"\r\n\
                   \"GTA5.exe\",\"9120\",\"Console\",\"1\",\"2,104,332 K\"\r\n\r\n";
        assert_eq!(
            parse_tasklist_csv(out),
            vec!["System Idle Process".to_string(), "GTA5.exe".to_string()]
        );
    }

    #[test]
    fn ps_names_include_basename_of_full_paths() {
        let out = "/Applications/Steam.app/Contents/MacOS/steam_osx\nbash\n\n";
        let names = parse_ps_names(out);
        assert!(names.contains(&"steam_osx".to_string()));
        assert!(names.contains(&"bash".to_string()));
        assert!(names.contains(&"/Applications/Steam.app/Contents/MacOS/steam_osx".to_string()));
    }

    #[test]
    fn basename_handles_both_separators() {
        assert_eq!(executable_basename("/usr/bin/steam"), Some("steam"));
        assert_eq!(
            executable_basename(r"C:\Games\GTA V\GTAVLauncher.exe"),
            Some("GTAVLauncher.exe")
        );
        assert_eq!(executable_basename("bash"), Some("bash"));
        assert_eq!(executable_basename("/trailing/"), None);
        assert_eq!(executable_basename("  "), None);
    }

    #[test]
    fn wql_escape_doubles_backslashes() {
        let path = PathBuf::from(r"C:\Games\GTA V\GTA5.exe");
        assert_eq!(escape_wql_path(&path), r"C:\\Games\\GTA V\\GTA5.exe");
    }

    #[test]
    fn probe_running_combines_checks() {
        assert!(Probe { by_name: false, by_path: Some(true) }.running());
        assert!(Probe { by_name: true, by_path: None }.running());
        assert!(!Probe { by_name: false, by_path: Some(false) }.running());
        assert!(!Probe { by_name: false, by_path: None }.running());
    }
}

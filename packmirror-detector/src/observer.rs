//! Platform process observers.
//!
//! - Windows: `tasklist /FO CSV /NH` for names, `wmic process where
//!   "ExecutablePath='…'" get ProcessId` for the path query.
//! - Linux: names and the path query both come from `/proc/<pid>`.
//! - Other unix: `ps -A -o comm=` for names, `ps -A -o pid=,comm=` for paths.
//! - Anything else: [`UnsupportedObserver`], which always errors so the gate
//!   fails open.

use std::path::Path;
use std::process::Command;

use crate::{LivenessError, ProcessObserver};

#[cfg(windows)]
pub type PlatformObserver = WindowsObserver;
#[cfg(unix)]
pub type PlatformObserver = PsObserver;
#[cfg(not(any(windows, unix)))]
pub type PlatformObserver = UnsupportedObserver;

/// The observer for the platform this binary was built for.
pub fn platform_observer() -> PlatformObserver {
    PlatformObserver::default()
}

/// Run `tool` to completion and return its stdout as text.
#[cfg_attr(target_os = "linux", allow(dead_code))]
fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, LivenessError> {
    let mut command = Command::new(tool);
    command.args(args);
    hide_console(&mut command);
    let output = command
        .output()
        .map_err(|source| LivenessError::Spawn { tool, source })?;
    if !output.status.success() {
        return Err(LivenessError::ToolFailed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(windows)]
fn hide_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
#[cfg_attr(target_os = "linux", allow(dead_code))]
fn hide_console(_command: &mut Command) {}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsObserver;

#[cfg(windows)]
impl ProcessObserver for WindowsObserver {
    fn process_names(&self) -> Result<Vec<String>, LivenessError> {
        let out = run_tool("tasklist", &["/FO", "CSV", "/NH"])?;
        Ok(crate::parse_tasklist_csv(&out))
    }

    fn query_by_path(&self, executable: &Path) -> Result<Vec<String>, LivenessError> {
        let clause = format!("ExecutablePath='{}'", crate::escape_wql_path(executable));
        let out = run_tool(
            "wmic",
            &["process", "where", &clause, "get", crate::PATH_QUERY_HEADER],
        )?;
        Ok(out.lines().map(str::to_string).collect())
    }
}

// ---------------------------------------------------------------------------
// Unix
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PsObserver;

#[cfg(unix)]
impl ProcessObserver for PsObserver {
    #[cfg(target_os = "linux")]
    fn process_names(&self) -> Result<Vec<String>, LivenessError> {
        proc_process_names(Path::new("/proc"))
    }

    #[cfg(not(target_os = "linux"))]
    fn process_names(&self) -> Result<Vec<String>, LivenessError> {
        let out = run_tool("ps", &["-A", "-o", "comm="])?;
        Ok(crate::parse_ps_names(&out))
    }

    #[cfg(target_os = "linux")]
    fn query_by_path(&self, executable: &Path) -> Result<Vec<String>, LivenessError> {
        proc_exe_matches(Path::new("/proc"), executable)
    }

    #[cfg(not(target_os = "linux"))]
    fn query_by_path(&self, executable: &Path) -> Result<Vec<String>, LivenessError> {
        let out = run_tool("ps", &["-A", "-o", "pid=,comm="])?;
        let wanted = executable.to_string_lossy();
        Ok(out
            .lines()
            .filter_map(|line| {
                let (pid, comm) = line.trim().split_once(char::is_whitespace)?;
                (comm.trim() == wanted).then(|| pid.to_string())
            })
            .collect())
    }
}

/// Numeric entries of `proc_root` as `(pid, dir)`.
#[cfg(unix)]
fn pid_dirs(proc_root: &Path) -> Result<Vec<(String, std::path::PathBuf)>, LivenessError> {
    let entries = std::fs::read_dir(proc_root).map_err(|source| LivenessError::Io {
        path: proc_root.to_path_buf(),
        source,
    })?;
    Ok(entries
        .flatten()
        .filter_map(|entry| {
            let pid = entry.file_name().to_str()?.to_string();
            if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some((pid, entry.path()))
        })
        .collect())
}

/// Process names under `proc_root`.
///
/// `comm` is cut to 15 bytes by the kernel, so each process also contributes
/// the file name of its `exe` link and of `argv[0]`. The latter is the only
/// full name available for other users' processes and for Wine programs,
/// whose `exe` is the loader.
#[cfg(unix)]
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn proc_process_names(proc_root: &Path) -> Result<Vec<String>, LivenessError> {
    let mut names = Vec::new();
    for (_, dir) in pid_dirs(proc_root)? {
        if let Ok(exe) = std::fs::read_link(dir.join("exe")) {
            if let Some(name) = exe.file_name() {
                names.push(name.to_string_lossy().into_owned());
            }
        }
        if let Ok(cmdline) = std::fs::read(dir.join("cmdline")) {
            let arg0 = cmdline.split(|b| *b == 0).next().unwrap_or_default();
            let arg0 = String::from_utf8_lossy(arg0);
            if let Some(base) = crate::executable_basename(&arg0) {
                names.push(base.to_string());
            }
        }
        if let Ok(comm) = std::fs::read_to_string(dir.join("comm")) {
            let comm = comm.trim();
            if !comm.is_empty() {
                names.push(comm.to_string());
            }
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// PIDs under `proc_root` whose `exe` link resolves to `executable`.
/// Entries that vanish or cannot be read (other users' processes) are skipped.
#[cfg(unix)]
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn proc_exe_matches(
    proc_root: &Path,
    executable: &Path,
) -> Result<Vec<String>, LivenessError> {
    let mut pids: Vec<String> = pid_dirs(proc_root)?
        .into_iter()
        .filter(|(_, dir)| {
            std::fs::read_link(dir.join("exe")).is_ok_and(|target| target == executable)
        })
        .map(|(pid, _)| pid)
        .collect();
    pids.sort();
    Ok(pids)
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Observer for platforms without a process-listing tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedObserver;

impl ProcessObserver for UnsupportedObserver {
    fn process_names(&self) -> Result<Vec<String>, LivenessError> {
        Err(LivenessError::Unsupported)
    }

    fn query_by_path(&self, _executable: &Path) -> Result<Vec<String>, LivenessError> {
        Err(LivenessError::Unsupported)
    }
}

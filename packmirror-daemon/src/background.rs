use std::path::Path;
use std::process::{Command, Stdio};

use crate::autostart::AUTOSTART_ARGS;
use crate::error::{io_err, DaemonError};

/// Relaunch `executable` as `run --autostart` with no console and null stdio.
/// Returns the child's pid; the child is not waited on.
pub fn spawn_detached(executable: &Path) -> Result<u32, DaemonError> {
    let mut command = Command::new(executable);
    command
        .args(AUTOSTART_ARGS)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut command);

    let child = command.spawn().map_err(|e| io_err(executable, e))?;
    let pid = child.id();
    tracing::info!(pid, executable = %executable.display(), "started background agent");
    Ok(pid)
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW | DETACHED_PROCESS);
}

#[cfg(not(windows))]
fn detach(_command: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn spawns_child_and_returns_pid() {
        let pid = spawn_detached(Path::new("/bin/true")).unwrap();
        assert!(pid > 0);
    }

    #[test]
    fn missing_executable_reports_path() {
        let err = spawn_detached(Path::new("/definitely/not/here/packmirror")).unwrap_err();
        match err {
            DaemonError::Io { path, .. } => {
                assert_eq!(path, Path::new("/definitely/not/here/packmirror"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

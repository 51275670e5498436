//! The platform observer against a real child process.

#![cfg(target_os = "linux")]

use std::path::Path;
use std::process::{Child, Command};
use std::thread::sleep;
use std::time::Duration;

use packmirror_core::ProcessTarget;
use packmirror_detector::{platform_observer, Liveness};
use tempfile::TempDir;

const ETXTBSY: i32 = 26;

/// Copy `/bin/sleep` under `name` and start it. Retries while another test
/// thread's fork still holds the freshly written binary open.
fn spawn_renamed_sleep(dir: &Path, name: &str) -> Child {
    let exe = dir.join(name);
    std::fs::copy("/bin/sleep", &exe).expect("copy sleep binary");
    for _ in 0..50 {
        match Command::new(&exe).arg("30").spawn() {
            Ok(child) => return child,
            Err(err) if err.raw_os_error() == Some(ETXTBSY) => {
                sleep(Duration::from_millis(20))
            }
            Err(err) => panic!("spawn {}: {err}", exe.display()),
        }
    }
    panic!("{} stayed busy", exe.display());
}

#[test]
fn names_longer_than_comm_limit_are_detected() {
    let tmp = TempDir::new().expect("tempdir");
    // `/proc/<pid>/exe` holds the resolved path.
    let dir = tmp.path().canonicalize().expect("canonical tempdir");
    let name = "GTAVLauncherLong.exe";
    let mut child = spawn_renamed_sleep(&dir, name);

    let liveness = Liveness::new(platform_observer());
    let by_name = liveness.is_running_by_name(name);
    let by_lowercase = liveness.is_running_by_name(&name.to_lowercase());
    let probe = liveness.probe(&ProcessTarget::from_executable(Some(&dir.join(name))));

    let _ = child.kill();
    let _ = child.wait();

    assert!(by_name, "{name} not found by name");
    assert!(by_lowercase);
    assert!(probe.by_name);
    assert_eq!(probe.by_path, Some(true));
}

#[test]
fn exited_process_is_not_reported() {
    let dir = TempDir::new().expect("tempdir");
    let name = "PackmirrorGoneTarget.exe";
    let mut child = spawn_renamed_sleep(dir.path(), name);
    let _ = child.kill();
    let _ = child.wait();

    let liveness = Liveness::new(platform_observer());
    assert!(!liveness.is_running_by_name(name));
    assert!(!liveness.is_running_by_path(&dir.path().join(name)));
}

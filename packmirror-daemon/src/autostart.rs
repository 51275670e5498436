use std::path::{Path, PathBuf};

use crate::error::DaemonError;
use crate::paths::{AUTOSTART_VALUE_NAME, DAEMON_LABEL};

/// Per-user `Run` key read by Windows at logon.
pub const RUN_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";

/// Arguments the autostarted process is launched with.
pub const AUTOSTART_ARGS: [&str; 2] = ["run", "--autostart"];

/// Generate a launchd agent plist that starts `binary run --autostart` at login.
pub fn generate_plist(binary_path: &Path, log_path: &Path) -> String {
    let binary = binary_path.display().to_string();
    let log = log_path.display().to_string();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{binary}</string>
    <string>{arg0}</string>
    <string>{arg1}</string>
  </array>
  <key>RunAtLoad</key>
  <true/>
  <key>KeepAlive</key>
  <false/>
  <key>StandardOutPath</key>
  <string>{log}</string>
  <key>StandardErrorPath</key>
  <string>{log}</string>
</dict>
</plist>
"#,
        label = DAEMON_LABEL,
        binary = binary,
        arg0 = AUTOSTART_ARGS[0],
        arg1 = AUTOSTART_ARGS[1],
        log = log,
    )
}

/// The `REG_SZ` value stored under [`RUN_KEY`]: quoted executable plus args.
pub fn run_key_value(executable: &Path) -> String {
    format!("\"{}\" {}", executable.display(), AUTOSTART_ARGS.join(" "))
}

/// `reg add` arguments registering `executable` under [`RUN_KEY`].
pub fn reg_add_args(executable: &Path) -> Vec<String> {
    vec![
        "add".to_string(),
        RUN_KEY.to_string(),
        "/v".to_string(),
        AUTOSTART_VALUE_NAME.to_string(),
        "/t".to_string(),
        "REG_SZ".to_string(),
        "/d".to_string(),
        run_key_value(executable),
        "/f".to_string(),
    ]
}

/// `reg delete` arguments removing the autostart value.
pub fn reg_delete_args() -> Vec<String> {
    vec![
        "delete".to_string(),
        RUN_KEY.to_string(),
        "/v".to_string(),
        AUTOSTART_VALUE_NAME.to_string(),
        "/f".to_string(),
    ]
}

/// Contents of `remove_autorun.bat`, a one-line manual undo for the user.
pub fn remove_script() -> String {
    format!("reg {}\r\n", reg_delete_args().join(" "))
}

/// Register `executable` to start at login. Returns the file that records
/// the registration (the plist on macOS, the undo script on Windows).
pub fn enable(home: &Path, executable: &Path) -> Result<PathBuf, DaemonError> {
    let path = platform::enable(home, executable)?;
    tracing::info!(
        executable = %executable.display(),
        record = %path.display(),
        "autostart enabled"
    );
    Ok(path)
}

/// Remove the login registration. A missing registration is not an error.
pub fn disable(home: &Path) -> Result<(), DaemonError> {
    platform::disable(home)?;
    tracing::info!("autostart disabled");
    Ok(())
}

#[cfg(any(windows, target_os = "macos"))]
fn run_tool(tool: &'static str, args: &[String], ignore_failure: bool) -> Result<(), DaemonError> {
    let output = std::process::Command::new(tool)
        .args(args.iter().map(String::as_str))
        .output()
        .map_err(|e| crate::error::io_err(tool, e))?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if ignore_failure {
        tracing::warn!(tool, status = %output.status, stderr = %stderr, "ignored tool failure");
        return Ok(());
    }
    Err(DaemonError::Autostart(format!(
        "{tool} failed (status {}): {} {}",
        output.status, stdout, stderr
    )))
}

#[cfg(windows)]
mod platform {
    use super::*;
    use crate::error::io_err;
    use crate::paths::remove_autorun_script_path;
    use std::fs;

    pub(super) fn enable(home: &Path, executable: &Path) -> Result<PathBuf, DaemonError> {
        run_tool("reg", &reg_add_args(executable), false)?;

        let script = remove_autorun_script_path(home);
        if let Some(dir) = script.parent() {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        fs::write(&script, remove_script()).map_err(|e| io_err(&script, e))?;
        Ok(script)
    }

    pub(super) fn disable(home: &Path) -> Result<(), DaemonError> {
        // Deleting an absent value fails; that is the expected "already off" case.
        run_tool("reg", &reg_delete_args(), true)?;
        let script = remove_autorun_script_path(home);
        if script.exists() {
            fs::remove_file(&script).map_err(|e| io_err(&script, e))?;
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::*;
    use crate::error::io_err;
    use crate::paths::{launch_agents_dir, launchd_log_path, launchd_plist_path, logs_dir};
    use std::fs;
    use std::process::Command;

    pub(super) fn enable(home: &Path, executable: &Path) -> Result<PathBuf, DaemonError> {
        for dir in [launch_agents_dir(home), logs_dir(home)] {
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }

        let plist = launchd_plist_path(home);
        fs::write(&plist, generate_plist(executable, &launchd_log_path(home)))
            .map_err(|e| io_err(&plist, e))?;

        let domain = launchctl_domain()?;
        let service = format!("{domain}/{DAEMON_LABEL}");
        run_tool("launchctl", &["bootout".to_string(), service], true)?;
        run_tool(
            "launchctl",
            &["bootstrap".to_string(), domain, plist.display().to_string()],
            false,
        )?;
        Ok(plist)
    }

    pub(super) fn disable(home: &Path) -> Result<(), DaemonError> {
        let plist = launchd_plist_path(home);
        if plist.exists() {
            let service = format!("{}/{DAEMON_LABEL}", launchctl_domain()?);
            run_tool("launchctl", &["bootout".to_string(), service], true)?;
            fs::remove_file(&plist).map_err(|e| io_err(&plist, e))?;
        }
        Ok(())
    }

    fn launchctl_domain() -> Result<String, DaemonError> {
        let output = Command::new("id")
            .arg("-u")
            .output()
            .map_err(|e| io_err("id -u", e))?;
        if !output.status.success() {
            return Err(DaemonError::Autostart(format!(
                "failed to resolve current uid (status {})",
                output.status
            )));
        }
        let uid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if uid.is_empty() {
            return Err(DaemonError::Autostart(
                "current uid from `id -u` was empty".to_string(),
            ));
        }
        Ok(format!("gui/{uid}"))
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod platform {
    use super::*;

    pub(super) fn enable(_home: &Path, _executable: &Path) -> Result<PathBuf, DaemonError> {
        Err(DaemonError::Autostart(
            "autostart registration is not supported on this platform".to_string(),
        ))
    }

    pub(super) fn disable(_home: &Path) -> Result<(), DaemonError> {
        Err(DaemonError::Autostart(
            "autostart registration is not supported on this platform".to_string(),
        ))
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use packmirror_core::config::config_dir_at;

pub const DAEMON_LABEL: &str = "dev.packmirror.agent";
/// Value name under the Windows `Run` key.
pub const AUTOSTART_VALUE_NAME: &str = "packmirror";

/// Sleep between the end of one cycle and the next liveness check.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(5);
/// Delay before the interactive launch prints its startup notice.
pub const STARTUP_NOTICE_DELAY: Duration = Duration::from_secs(3);

pub const APP_LOG: &str = "app.log";
pub const LAUNCHD_LOG: &str = "launchd.log";
pub const REMOVE_AUTORUN_SCRIPT: &str = "remove_autorun.bat";

pub fn logs_dir(home: &Path) -> PathBuf {
    config_dir_at(home).join("logs")
}

pub fn app_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(APP_LOG)
}

pub fn launchd_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(LAUNCHD_LOG)
}

pub fn remove_autorun_script_path(home: &Path) -> PathBuf {
    config_dir_at(home).join(REMOVE_AUTORUN_SCRIPT)
}

pub fn launch_agents_dir(home: &Path) -> PathBuf {
    home.join("Library").join("LaunchAgents")
}

pub fn launchd_plist_path(home: &Path) -> PathBuf {
    launch_agents_dir(home).join(format!("{DAEMON_LABEL}.plist"))
}

//! Persisted configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.packmirror/
//!   config.json   (mode 0600, written on first setup)
//! ```
//!
//! # API pattern
//!
//! Every function touching the filesystem has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! The only check performed on load is that the file exists and parses.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{MirrorPair, PairLabel, ProcessTarget};

pub const CONFIG_FILE: &str = "config.json";

/// The flat record written by `packmirror setup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Directory holding the current gunpack files.
    pub gunpack_new_path: PathBuf,
    /// Where gunpack files are mirrored to.
    pub gunpack_old_path: PathBuf,
    pub redux_new_path: PathBuf,
    pub redux_old_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_executable_path: Option<PathBuf>,
    #[serde(default)]
    pub autostart_enabled: bool,
}

impl AppConfig {
    /// Pairs in mirroring order: gunpack, redux, then the tertiary backup of
    /// the gunpack sources under the user's home.
    pub fn mirror_pairs_at(&self, home: &Path) -> Vec<MirrorPair> {
        vec![
            MirrorPair::new(
                PairLabel::Gunpack,
                &self.gunpack_new_path,
                &self.gunpack_old_path,
            ),
            MirrorPair::new(PairLabel::Redux, &self.redux_new_path, &self.redux_old_path),
            MirrorPair::new(
                PairLabel::Backup,
                &self.gunpack_new_path,
                backup_root_at(home).join("gunpack"),
            ),
        ]
    }

    /// `mirror_pairs_at` convenience wrapper.
    pub fn mirror_pairs(&self) -> Result<Vec<MirrorPair>, ConfigError> {
        Ok(self.mirror_pairs_at(&home()?))
    }

    pub fn process_target(&self) -> ProcessTarget {
        ProcessTarget::from_executable(self.target_executable_path.as_deref())
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.packmirror/`
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".packmirror")
}

/// `<home>/.packmirror/config.json`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join(CONFIG_FILE)
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

/// `<home>/Documents/packmirror-backup/`: destination root of the tertiary pair.
pub fn backup_root_at(home: &Path) -> PathBuf {
    home.join("Documents").join("packmirror-backup")
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// True when `config.json` is present; its contents are not inspected.
pub fn exists_at(home: &Path) -> bool {
    config_path_at(home).is_file()
}

/// `exists_at` convenience wrapper.
pub fn exists() -> Result<bool, ConfigError> {
    Ok(exists_at(&home()?))
}

/// Load `<home>/.packmirror/config.json`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path) if malformed.
pub fn load_at(home: &Path) -> Result<AppConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<AppConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the config to `<home>/.packmirror/config.json`.
///
/// Write flow: serialize → `config.json.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let dir = config_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name(format!("{CONFIG_FILE}.tmp"));

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&tmp_path, json).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    Ok(path)
}

/// `save_at` convenience wrapper.
pub fn save(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> AppConfig {
        AppConfig {
            gunpack_new_path: PathBuf::from("/mods/gunpack-new"),
            gunpack_old_path: PathBuf::from("/mods/gunpack-old"),
            redux_new_path: PathBuf::from("/mods/redux-new"),
            redux_old_path: PathBuf::from("/mods/redux-old"),
            target_executable_path: None,
            autostart_enabled: false,
        }
    }

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(config_path_at(home.path()).ends_with(".packmirror/config.json"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().expect("tempdir");
        save_at(home.path(), &sample()).expect("save");
        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn save_creates_private_dir_and_file() {
        let home = TempDir::new().expect("tempdir");
        let path = save_at(home.path(), &sample()).expect("save");
        assert!(path.exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let dir_mode = std::fs::metadata(config_dir_at(home.path()))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(dir_mode, 0o700);
            assert_eq!(file_mode, 0o600);
        }
    }

    #[test]
    fn save_cleans_up_tmp() {
        let home = TempDir::new().expect("tempdir");
        save_at(home.path(), &sample()).expect("save");
        let tmp = config_path_at(home.path()).with_file_name("config.json.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn exists_only_checks_presence() {
        let home = TempDir::new().expect("tempdir");
        assert!(!exists_at(home.path()));
        std::fs::create_dir_all(config_dir_at(home.path())).unwrap();
        std::fs::write(config_path_at(home.path()), "not json").unwrap();
        assert!(exists_at(home.path()));
    }

    #[test]
    fn pairs_are_in_fixed_order_with_backup_under_home() {
        let home = TempDir::new().expect("tempdir");
        let pairs = sample().mirror_pairs_at(home.path());
        let labels: Vec<PairLabel> = pairs.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            vec![PairLabel::Gunpack, PairLabel::Redux, PairLabel::Backup]
        );
        assert_eq!(pairs[2].source_root, PathBuf::from("/mods/gunpack-new"));
        assert!(pairs[2].dest_root.starts_with(home.path()));
        assert!(pairs[2]
            .dest_root
            .ends_with("Documents/packmirror-backup/gunpack"));
    }

    #[test]
    fn target_follows_executable_path() {
        let mut cfg = sample();
        assert_eq!(cfg.process_target().process_name, "GTA5.exe");
        cfg.target_executable_path = Some(PathBuf::from("/games/Other/game.exe"));
        let target = cfg.process_target();
        assert_eq!(target.process_name, "game.exe");
        assert_eq!(
            target.full_path,
            Some(PathBuf::from("/games/Other/game.exe"))
        );
    }
}

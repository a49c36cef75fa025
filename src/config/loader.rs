//! # Layered configuration loading.
//!
//! Configuration files are searched under `<dir>/dbus-systemd-dispatcher/`
//! for every directory on the search path:
//!
//! 1. an explicit `--search-path` directory, if given (highest priority)
//! 2. `$XDG_CONFIG_HOME` (default `$HOME/.config`)
//! 3. each entry of `$XDG_CONFIG_DIRS` (default `/etc/xdg`), left to right
//!
//! By default every file found is merged, higher-priority entries overriding
//! per-target and per-settings-field. In override mode only the
//! highest-priority file is applied. Finding no file at all is fatal;
//! malformed or unreadable files are fatal too (a silent skip would hide the
//! actual configuration being dropped).

use std::env;
use std::path::{Path, PathBuf};

use crate::config::model::{FileConfig, Settings, TargetConfig};
use crate::error::StartupError;

/// Subdirectory searched inside every search-path entry.
pub const CONFIG_SUBDIR: &str = "dbus-systemd-dispatcher";

/// Ordered list of configuration directories, highest priority first.
#[derive(Debug, Clone)]
pub struct SearchPath {
    pub dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Builds the search path from the environment, optionally prefixed by an
    /// explicit extra directory.
    pub fn from_env(extra: Option<PathBuf>) -> Self {
        let mut dirs = Vec::new();
        if let Some(dir) = extra {
            dirs.push(dir);
        }

        let config_home = env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
        if let Some(dir) = config_home {
            dirs.push(dir);
        }

        let config_dirs = env::var("XDG_CONFIG_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/etc/xdg".to_string());
        for dir in config_dirs.split(':').filter(|s| !s.is_empty()) {
            dirs.push(PathBuf::from(dir));
        }

        Self { dirs }
    }
}

/// Loads and resolves the configuration.
///
/// `override_mode` applies only the highest-priority file instead of merging.
pub fn load(
    search: &SearchPath,
    file_name: &str,
    override_mode: bool,
) -> Result<(Vec<TargetConfig>, Settings), StartupError> {
    let mut merged: Option<FileConfig> = None;

    // Lowest priority first, so later (higher-priority) files override.
    for dir in search.dirs.iter().rev() {
        let path = dir.join(CONFIG_SUBDIR).join(file_name);
        let Some(cfg) = read_file(&path)? else {
            continue;
        };
        merged = Some(match merged.take() {
            None => cfg,
            Some(lower) => lower.merge(cfg),
        });
    }

    if override_mode {
        // Redo the walk top-down and keep only the first hit.
        merged = None;
        for dir in &search.dirs {
            let path = dir.join(CONFIG_SUBDIR).join(file_name);
            if let Some(cfg) = read_file(&path)? {
                merged = Some(cfg);
                break;
            }
        }
    }

    match merged {
        Some(cfg) => Ok(cfg.resolve()),
        None => Err(StartupError::ConfigNotFound {
            file: file_name.to_string(),
        }),
    }
}

/// Reads and parses one file; `Ok(None)` when it does not exist.
fn read_file(path: &Path) -> Result<Option<FileConfig>, StartupError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StartupError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let cfg = serde_yaml::from_str(&raw).map_err(|source| StartupError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cfg))
}

//! Program-wide settings for emroute, read from `settings.toml` in the user's configuration
//! directory (e.g. `~/.config/emroute/settings.toml` on Linux).
//!
//! These apply to every scenario run on the machine. Anything that changes the routing itself
//! belongs in the scenario's `model.toml` instead (see [`crate::parameters`]).
use crate::get_emroute_config_dir;
use crate::input::{input_err_msg, read_toml};
use crate::log::{DEFAULT_LOG_LEVEL, parse_log_level};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// The location of the settings file, which need not exist
pub fn get_settings_file_path() -> PathBuf {
    get_emroute_config_dir().join(SETTINGS_FILE_NAME)
}

/// Settings for the `emroute` command
#[derive(Debug, Deserialize, PartialEq)]
pub struct Settings {
    /// How much the `run` and `validate` commands log (`off`, `error`, `warn`, `info`, `debug` or
    /// `trace`). `trace` also shows the solver's own output. Overridden by `EMROUTE_LOG_LEVEL`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load the user's settings, using defaults if there is no settings file.
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Load settings from `file_path`, checking that the log level is one emroute understands
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        parse_log_level(&settings.log_level).with_context(|| input_err_msg(file_path))?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "log_level = \"trace\"\n").unwrap();

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "trace".to_string(),
            }
        );
    }

    #[test]
    fn test_settings_load_from_path_empty_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "").unwrap();

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path_bad_log_level() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "log_level = \"loud\"\n").unwrap();

        let err = Settings::load_from_path(&file_path).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            format!("{}: Unknown log level: loud", input_err_msg(&file_path))
        );
    }

    #[test]
    fn test_settings_file_path() {
        assert!(get_settings_file_path().ends_with("emroute/settings.toml"));
    }
}

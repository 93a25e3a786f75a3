//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory
//! (`~/.config/portprobe` on Linux). A missing file means defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::probes::{DEFAULT_READ_TIMEOUT, DEFAULT_SESSION_TIMEOUT};
use crate::scanner::{DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT};
use crate::services::DEFAULT_SERVICES_FILE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/portprobe)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "portprobe", "portprobe")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Maximum number of concurrently running scan tasks.
    pub concurrency: usize,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Ceiling for one service identification session, in milliseconds.
    pub probe_session_timeout_ms: u64,
    /// Read timeout for a single probe, in milliseconds.
    pub probe_read_timeout_ms: u64,
    /// Port/service name registry file.
    pub services_file: PathBuf,
    /// Try generic probes when a port's own probes do not match.
    pub fallback_probes: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            probe_session_timeout_ms: DEFAULT_SESSION_TIMEOUT.as_millis() as u64,
            probe_read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            services_file: PathBuf::from(DEFAULT_SERVICES_FILE),
            fallback_probes: false,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if there are none.
    pub fn load() -> ConfigResult<Self> {
        Self::load_discovered(Paths::discover())
    }

    /// An undiscoverable config directory (no `$HOME`) means defaults.
    fn load_discovered(paths: ConfigResult<Paths>) -> ConfigResult<Self> {
        match paths {
            Ok(paths) => Self::load_in(&paths),
            Err(e) => {
                debug!("{}; using default settings", e);
                Ok(Self::default())
            }
        }
    }

    /// Load `settings.json` from a config directory, or defaults if it is absent.
    pub fn load_in(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the scanner cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "concurrency must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("probe_session_timeout_ms", self.probe_session_timeout_ms),
            ("probe_read_timeout_ms", self.probe_read_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn probe_session_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_session_timeout_ms)
    }

    pub fn probe_read_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.concurrency, 1000);
        assert_eq!(settings.connect_timeout_ms, 2000);
        assert_eq!(settings.probe_session_timeout_ms, 5000);
        assert_eq!(settings.probe_read_timeout_ms, 1000);
        assert_eq!(settings.services_file, PathBuf::from("/usr/share/nmap/nmap-services"));
        assert!(!settings.fallback_probes);
        assert_ok!(settings.validate());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"concurrency": 64, "fallback_probes": true}}"#).unwrap();

        let settings = AppSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.concurrency, 64);
        assert!(settings.fallback_probes);
        assert_eq!(settings.connect_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(file.path()),
            Err(ConfigError::InvalidFormat(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"connect_timeout_ms": 0}}"#).unwrap();
        assert!(matches!(
            AppSettings::load_from(file.path()),
            Err(ConfigError::InvalidValue(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert_err!(AppSettings::load_from(&dir.path().join("missing.json")));
    }

    #[test]
    fn test_load_in_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            config_dir: dir.path().to_path_buf(),
        };
        assert_eq!(AppSettings::load_in(&paths).unwrap(), AppSettings::default());

        std::fs::write(paths.settings_file(), r#"{"concurrency": 12}"#).unwrap();
        assert_eq!(AppSettings::load_in(&paths).unwrap().concurrency, 12);
    }

    #[test]
    fn test_missing_config_dir_uses_defaults() {
        let settings = AppSettings::load_discovered(Err(ConfigError::DirectoryNotFound)).unwrap();
        assert_eq!(settings, AppSettings::default());

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "not json").unwrap();
        let paths = Paths {
            config_dir: dir.path().to_path_buf(),
        };
        assert_err!(AppSettings::load_discovered(Ok(paths)));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}

//! Platform abstraction module.
//!
//! Resolves the OS-specific directories the viewer writes into: the config
//! directory holding `config.ron`, the data directory for screenshots, and
//! the log directory. All platform-specific path logic is isolated here.

use std::path::PathBuf;
use std::{fmt, io};

/// Errors that can occur during platform operations.
#[derive(Debug)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    NoConfigDir,
    /// An I/O error occurred (e.g., directory creation failed).
    Io(io::Error),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConfigDir => write!(f, "could not determine OS configuration directory"),
            Self::Io(e) => write!(f, "platform I/O error: {e}"),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PlatformError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// OS-specific directory paths for the viewer.
///
/// Each field resolves to the platform-appropriate location following OS
/// conventions (XDG on Linux, Known Folders on Windows, Library on macOS).
pub struct PlatformDirs {
    /// User configuration: `config.ron`, scene files.
    pub config_dir: PathBuf,
    /// Persistent data: screenshots.
    pub data_dir: PathBuf,
    /// Log files.
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "orrery";

impl PlatformDirs {
    /// Resolve platform-specific directories without creating them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
        let app_config = config_base.join(APP_NAME);

        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| app_config.clone())
            .join(APP_NAME);

        Ok(Self {
            config_dir: app_config.clone(),
            data_dir,
            log_dir: app_config.join("logs"),
        })
    }

    /// Resolve directories and create them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if resolution or directory creation fails.
    pub fn resolve_and_create() -> Result<Self, PlatformError> {
        let dirs = Self::resolve()?;
        dirs.create_dirs()?;
        Ok(dirs)
    }

    /// Resolve directories rooted under a custom base path.
    ///
    /// Used when `--config` points at an explicit directory, and in tests.
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            data_dir: root.join("data"),
            log_dir: root.join("logs"),
        }
    }

    /// Create all directories on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] if any directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_exists() {
        let config = dirs::config_dir();
        assert!(config.is_some(), "dirs::config_dir() returned None");
        let path = config.unwrap();
        assert!(!path.as_os_str().is_empty(), "config_dir path is empty");
    }

    #[test]
    fn test_platform_dirs_resolve() {
        let dirs = PlatformDirs::resolve().expect("PlatformDirs::resolve() failed");
        assert!(dirs.config_dir.is_absolute(), "config_dir is not absolute");
        assert!(dirs.data_dir.is_absolute(), "data_dir is not absolute");
        assert!(dirs.log_dir.is_absolute(), "log_dir is not absolute");
    }

    #[test]
    fn test_directory_creation() {
        let tmp = std::env::temp_dir().join("orrery-test-platform-dirs");
        // Clean up from any prior run.
        let _ = std::fs::remove_dir_all(&tmp);

        let dirs = PlatformDirs::rooted_at(&tmp);
        dirs.create_dirs().expect("create_dirs failed for temp root");

        assert!(dirs.config_dir.exists(), "config_dir was not created");
        assert!(dirs.data_dir.exists(), "data_dir was not created");
        assert!(dirs.log_dir.exists(), "log_dir was not created");

        // Clean up.
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn test_rooted_dirs_stay_under_root() {
        let root = std::path::Path::new("/tmp/orrery-root");
        let dirs = PlatformDirs::rooted_at(root);
        assert!(dirs.config_dir.starts_with(root));
        assert!(dirs.data_dir.starts_with(root));
        assert!(dirs.log_dir.starts_with(root));
    }
}

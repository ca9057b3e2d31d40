//! Platform directory resolution.

use std::path::{Path, PathBuf};

/// Errors that can occur while resolving or creating platform directories.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// Directory creation failed.
    #[error("platform I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the orrery keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// JSON log files of debug builds.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve the OS directories, or root them under `config_override`
    /// when the user passed `--config`.
    pub fn resolve(config_override: Option<&Path>) -> Result<Self, PlatformError> {
        if let Some(dir) = config_override {
            return Ok(Self::resolve_with_root(dir));
        }
        let config_dir = orrery_config::default_config_dir().ok_or(PlatformError::NoConfigDir)?;
        let log_dir = dirs::data_local_dir()
            .map(|d| d.join("orrery").join("logs"))
            .unwrap_or_else(|| config_dir.join("logs"));
        Ok(Self {
            config_dir,
            log_dir,
        })
    }

    /// Directories rooted under a custom base path.
    pub fn resolve_with_root(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            log_dir: root.join("logs"),
        }
    }

    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_roots_everything() {
        let dirs = PlatformDirs::resolve(Some(Path::new("/tmp/orrery-test"))).unwrap();
        assert_eq!(dirs.config_dir, PathBuf::from("/tmp/orrery-test"));
        assert_eq!(dirs.log_dir, PathBuf::from("/tmp/orrery-test/logs"));
    }

    #[test]
    fn test_create_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::resolve_with_root(&tmp.path().join("orrery"));
        dirs.create_dirs().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
    }
}

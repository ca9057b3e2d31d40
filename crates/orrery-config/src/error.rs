//! Errors raised while persisting the orrery configuration.

use std::path::PathBuf;

/// A `config.ron` could not be read, written, or understood.
///
/// Every file-level variant names the file it concerns, so a failed reload
/// can be traced back to the offending path in the logs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a valid configuration. `source` carries the
    /// line and column of the first error.
    #[error("invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[source] ron::Error),
}

impl ConfigError {
    /// The file the error concerns, if it concerns one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Write { path, .. }
            | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Serialize(_) => None,
        }
    }
}

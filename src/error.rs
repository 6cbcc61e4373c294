use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegressError {
    #[error("Regression test data not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("Failed to decompress {}: {1}", .0.display())]
    Decompress(PathBuf, String),

    #[error("Compressor exe not found: {}", .0.display())]
    CompressorNotFound(PathBuf),

    /// Holds where the clips were looked for.
    #[error("No regression clips found in {0}")]
    NoClips(String),

    #[error("No regression configurations found in {0}")]
    NoConfigs(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Regression run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegressError {
    /// Environment errors are detected before any worker starts.
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            RegressError::ArchiveNotFound(_)
                | RegressError::Decompress(..)
                | RegressError::CompressorNotFound(_)
                | RegressError::NoClips(_)
                | RegressError::NoConfigs(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RegressError>;

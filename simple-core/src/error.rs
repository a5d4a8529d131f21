//! Structured error types for simple-core.
//!
//! Driver crates keep their own error enums; this one only covers loading
//! configuration from disk.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// Config file is not valid TOML or does not match the expected shape
    #[error("Failed to parse config (invalid TOML): {0}")]
    Parse(#[from] toml::de::Error),

    /// Requested `[section]` is not present in the file
    #[error("Config section '{section}' not found")]
    MissingSection { section: String },
}

/// Result type alias for simple-core operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create an I/O error bound to the file that failed
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a missing section error
    pub fn missing_section(section: impl Into<String>) -> Self {
        Self::MissingSection {
            section: section.into(),
        }
    }
}

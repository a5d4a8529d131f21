//! Error types for simple-mongo
//!
//! Driver and codec failures are carried transparently: the message and
//! source chain a caller sees are the driver's own.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::index::IndexError;

/// Error returned by a lifecycle hook
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    #[error(transparent)]
    Encode(#[from] bson::ser::Error),

    #[error(transparent)]
    Decode(#[from] bson::de::Error),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// A before/after hook refused the operation
    #[error("hook failed: {0}")]
    Hook(HookError),

    /// `prepare_id` rejected the identifier
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// TLS material could not be loaded at bootstrap
    #[error("TLS material {path:?}: {reason}")]
    Tls { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn tls(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Tls {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_error_keeps_message() {
        let err = Error::Hook("title is required".into());
        assert_eq!(err.to_string(), "hook failed: title is required");
    }

    #[test]
    fn index_error_is_transparent() {
        let err: Error = IndexError::MissingTtlSeconds {
            field: "expires_at".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            IndexError::MissingTtlSeconds {
                field: "expires_at".into()
            }
            .to_string()
        );
    }
}

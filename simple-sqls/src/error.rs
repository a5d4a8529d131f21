//! Error types for simple-sqls

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SqlsError>;

#[derive(Error, Debug)]
pub enum SqlsError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A `where_` fragment's `?` count differs from its argument count
    #[error("fragment '{fragment}' has {placeholders} placeholder(s) but {args} argument(s)")]
    Placeholders {
        fragment: String,
        placeholders: usize,
        args: usize,
    },

    /// `address` is neither a URL nor `host[:port]`
    #[error("invalid database address '{0}'")]
    Address(String),

    /// A configured TLS file does not exist
    #[error("TLS file not found: {0:?}")]
    TlsFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_message() {
        let err = SqlsError::Placeholders {
            fragment: "a = ? AND b = ?".into(),
            placeholders: 2,
            args: 1,
        };
        assert_eq!(
            err.to_string(),
            "fragment 'a = ? AND b = ?' has 2 placeholder(s) but 1 argument(s)"
        );
    }
}

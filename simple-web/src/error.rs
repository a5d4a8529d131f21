//! Application error carrying a response code

use serde_json::Value;
use thiserror::Error;

/// Error whose code, message and data end up in the response envelope.
///
/// Return it (or wrap it as a `source`) from anywhere below a handler;
/// [`json_error`](crate::json_error) finds it in the source chain.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{msg}")]
pub struct CodeError {
    pub code: i32,
    pub msg: String,
    pub data: Option<Value>,
}

impl CodeError {
    pub fn new(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

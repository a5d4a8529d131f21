//! JSON response envelope
//!
//! Every response body has the same shape:
//!
//! ```json
//! { "code": 0, "msg": "", "data": ..., "success": true }
//! ```
//!
//! `JsonResult` implements `IntoResponse` with status 200; failures are
//! signalled through `success` and `code`, not the HTTP status.

use std::error::Error as StdError;

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResult<T = Value> {
    pub code: i32,
    pub msg: String,
    pub data: Option<T>,
    pub success: bool,
}

/// Offset-paged payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub total: i64,
    pub results: Vec<T>,
}

/// Cursor-paged payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorResult<T> {
    pub results: Vec<T>,
    /// Cursor to request the next batch with
    pub cursor: String,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl<T: Serialize> IntoResponse for JsonResult<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn json<T>(code: i32, msg: impl Into<String>, data: Option<T>, success: bool) -> JsonResult<T> {
    JsonResult {
        code,
        msg: msg.into(),
        data,
        success,
    }
}

pub fn json_data<T>(data: T) -> JsonResult<T> {
    json(0, "", Some(data), true)
}

pub fn json_item_list<T>(items: Vec<T>) -> JsonResult<Vec<T>> {
    json_data(items)
}

pub fn json_page_data<T>(results: Vec<T>, total: i64) -> JsonResult<PageResult<T>> {
    json_data(PageResult { total, results })
}

pub fn json_cursor_data<T>(
    results: Vec<T>,
    cursor: impl Into<String>,
    has_more: bool,
) -> JsonResult<CursorResult<T>> {
    json_data(CursorResult {
        results,
        cursor: cursor.into(),
        has_more,
    })
}

pub fn json_success() -> JsonResult {
    json(0, "", None, true)
}

/// Failure envelope for `err`.
///
/// The first [`CodeError`] found walking `err` and its sources supplies
/// code, message and data; otherwise the code is 0 and the message is
/// `err`'s display text.
pub fn json_error(err: &(dyn StdError + 'static)) -> JsonResult {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(code_err) = e.downcast_ref::<CodeError>() {
            return json(code_err.code, code_err.msg.clone(), code_err.data.clone(), false);
        }
        current = e.source();
    }
    json_error_msg(err.to_string())
}

pub fn json_error_msg(msg: impl Into<String>) -> JsonResult {
    json_error_code(0, msg)
}

pub fn json_error_code(code: i32, msg: impl Into<String>) -> JsonResult {
    json(code, msg, None, false)
}

pub fn json_error_data(code: i32, msg: impl Into<String>, data: impl Into<Value>) -> JsonResult {
    json(code, msg, Some(data.into()), false)
}

impl From<CodeError> for JsonResult {
    fn from(err: CodeError) -> Self {
        json(err.code, err.msg, err.data, false)
    }
}

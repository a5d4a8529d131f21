//! simple-web: response envelope and parameter helpers for axum handlers
//!
//! - [`JsonResult`] is the `{code, msg, data, success}` envelope every
//!   handler answers with, plus [`PageResult`] and [`CursorResult`] payloads
//! - [`CodeError`] carries an application error code through `?` so
//!   [`json_error`] can surface it
//! - [`Params`] extracts form and query values with typed, defaulting
//!   accessors

pub mod error;
pub mod params;
pub mod result;
pub mod rsp;

pub use error::CodeError;
pub use params::{ParamError, Params};
pub use result::{
    json, json_cursor_data, json_data, json_error, json_error_code, json_error_data,
    json_error_msg, json_item_list, json_page_data, json_success, CursorResult, JsonResult,
    PageResult,
};
pub use rsp::{convert_list, RspBuilder};

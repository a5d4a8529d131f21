//! Request parameter extraction
//!
//! [`Params`] gathers url-encoded form body values (non-GET requests) and
//! then query-string values. Lookups return the first value recorded for a
//! name, and an empty value counts as absent.
//!
//! ```no_run
//! use simple_web::{json_page_data, JsonResult, PageResult, ParamError, Params};
//!
//! async fn list(params: Params) -> Result<JsonResult<PageResult<String>>, ParamError> {
//!     let status = params.required("status")?;
//!     let paging = params.paging();
//!     let rows = vec![format!("{} page {}", status, paging.page)];
//!     Ok(json_page_data(rows, 1))
//! }
//! ```

use axum::extract::{FromRequest, Query, Request};
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::Form;
use chrono::{NaiveDate, NaiveDateTime};
use simple_core::Paging;
use thiserror::Error;

use crate::result::{json_error, JsonResult};

/// Accepted date/time layouts, tried in order
const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_ONLY: &str = "%Y-%m-%d";

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("unable to find param value '{name}'")]
    Missing { name: String },

    #[error("invalid value '{value}' for param '{name}'")]
    Invalid { name: String, value: String },

    /// Query string or form body could not be decoded
    #[error("malformed request parameters: {0}")]
    Malformed(String),
}

impl ParamError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing { name: name.into() }
    }

    pub fn invalid(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<ParamError> for JsonResult {
    fn from(err: ParamError) -> Self {
        json_error(&err)
    }
}

impl IntoResponse for ParamError {
    fn into_response(self) -> Response {
        tracing::debug!("rejected request parameters: {}", self);
        JsonResult::from(self).into_response()
    }
}

/// Form and query values of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(String, String)>,
}

impl<S> FromRequest<S> for Params
where
    S: Send + Sync,
{
    type Rejection = ParamError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query): Query<Vec<(String, String)>> = Query::try_from_uri(req.uri())
            .map_err(|e| ParamError::Malformed(e.body_text()))?;

        let mut values = Vec::new();
        if has_form_body(&req) {
            let Form(form): Form<Vec<(String, String)>> = Form::from_request(req, state)
                .await
                .map_err(|e| ParamError::Malformed(e.body_text()))?;
            values.extend(form);
        }
        values.extend(query);

        Ok(Self { values })
    }
}

fn has_form_body(req: &Request) -> bool {
    if req.method() == Method::GET || req.method() == Method::HEAD {
        return false;
    }
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl Params {
    /// Build from already decoded pairs, earlier pairs taking precedence.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for `name`, `None` when missing or empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        parse_bool(self.get(name)?.trim())
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.trim().parse().ok()
    }

    /// Date or date-time value; see [`parse_date_time`].
    pub fn get_time(&self, name: &str) -> Option<NaiveDateTime> {
        parse_date_time(self.get(name)?)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDateTime> {
        self.get_time(name)
    }

    pub fn required(&self, name: &str) -> Result<&str, ParamError> {
        self.get(name).ok_or_else(|| ParamError::missing(name))
    }

    pub fn i64(&self, name: &str) -> Result<i64, ParamError> {
        let raw = self.required(name)?;
        raw.trim().parse().map_err(|_| ParamError::invalid(name, raw))
    }

    pub fn i32(&self, name: &str) -> Result<i32, ParamError> {
        let raw = self.required(name)?;
        raw.trim().parse().map_err(|_| ParamError::invalid(name, raw))
    }

    pub fn bool(&self, name: &str) -> Result<bool, ParamError> {
        let raw = self.required(name)?;
        parse_bool(raw.trim()).ok_or_else(|| ParamError::invalid(name, raw))
    }

    pub fn value_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn i64_or(&self, name: &str, default: i64) -> i64 {
        self.get_i64(name).unwrap_or(default)
    }

    pub fn i32_or(&self, name: &str, default: i32) -> i32 {
        self.get_i32(name).unwrap_or(default)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.get_bool(name).unwrap_or(default)
    }

    /// Comma separated integers; entries that do not parse are skipped.
    pub fn i64_array(&self, name: &str) -> Vec<i64> {
        self.get(name)
            .map(|raw| raw.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default()
    }

    /// Comma separated strings, trimmed, blanks skipped.
    pub fn string_array(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `page` / `limit` with defaults 1 and 20; non-positive values fall
    /// back to the defaults.
    pub fn paging(&self) -> Paging {
        let page = self.i64_or("page", DEFAULT_PAGE);
        let limit = self.i64_or("limit", DEFAULT_LIMIT);
        Paging::new(
            if page > 0 { page } else { DEFAULT_PAGE },
            if limit > 0 { limit } else { DEFAULT_LIMIT },
        )
    }
}

/// `1 t T TRUE true True` and `0 f F FALSE false False`
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(dt) = DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, DATE_ONLY)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

//! Bind arguments for condition fragments

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A value bound to one `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Rendered as a literal `NULL`, not bound
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
}

impl SqlValue {
    /// Push this value onto `builder` as a bind parameter.
    pub(crate) fn push_to(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::Null => {
                builder.push("NULL");
            }
            Self::Bool(v) => {
                builder.push_bind(v);
            }
            Self::Int(v) => {
                builder.push_bind(v);
            }
            Self::Float(v) => {
                builder.push_bind(v);
            }
            Self::Text(v) => {
                builder.push_bind(v);
            }
            Self::Uuid(v) => {
                builder.push_bind(v);
            }
            Self::Timestamp(v) => {
                builder.push_bind(v);
            }
            Self::TextArray(v) => {
                builder.push_bind(v);
            }
            Self::IntArray(v) => {
                builder.push_bind(v);
            }
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(v: Vec<String>) -> Self {
        Self::TextArray(v)
    }
}

impl From<Vec<&str>> for SqlValue {
    fn from(v: Vec<&str>) -> Self {
        Self::TextArray(v.into_iter().map(str::to_owned).collect())
    }
}

impl From<Vec<i64>> for SqlValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntArray(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

//! simple-sqls: relational conveniences over `sqlx` (PostgreSQL)
//!
//! [`Cnd`] collects parameterised predicates, sort keys and paging and
//! renders them into a `sqlx::QueryBuilder`; [`connect`] builds a pinged
//! pool from the shared [`DatabaseConfig`](simple_core::DatabaseConfig).

pub mod cnd;
pub mod error;
pub mod ident;
pub mod pool;
pub mod value;

pub use cnd::Cnd;
pub use error::{Result, SqlsError};
pub use ident::{null_string, quote_ident};
pub use pool::{connect, connect_options, pool_options, SqlDb};
pub use value::SqlValue;

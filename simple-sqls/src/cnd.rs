//! Fluent condition builder for PostgreSQL
//!
//! Predicates are kept as SQL fragments with `?` placeholders plus their
//! arguments, and are joined with `AND` in call order when a query is built.
//! Column names go through [`quote_ident`]; values are always bound.
//!
//! ```
//! use simple_sqls::Cnd;
//!
//! let cnd = Cnd::new()
//!     .eq("status", "active")
//!     .in_("kind", vec![1, 2])
//!     .desc("created_at")
//!     .page(3, 10);
//!
//! assert_eq!(
//!     cnd.to_sql("tasks").unwrap(),
//!     "SELECT * FROM \"tasks\" WHERE \"status\" = $1 AND \"kind\" IN ($2, $3) \
//!      ORDER BY \"created_at\" DESC LIMIT $4 OFFSET $5"
//! );
//! ```

use simple_core::Paging;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::{Result, SqlsError};
use crate::ident::quote_ident;
use crate::value::SqlValue;

/// One `WHERE` fragment and the values for its placeholders
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    sql: String,
    args: Vec<SqlValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cnd {
    select_cols: Vec<String>,
    params: Vec<Fragment>,
    orders: Vec<(String, bool)>,
    paging: Option<Paging>,
}

impl Cnd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_cols.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn eq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.compare(column, "=", value)
    }

    pub fn not_eq(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.compare(column, "<>", value)
    }

    pub fn gt(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.compare(column, ">", value)
    }

    pub fn gte(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.compare(column, ">=", value)
    }

    pub fn lt(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.compare(column, "<", value)
    }

    pub fn lte(self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.compare(column, "<=", value)
    }

    /// Substring match, `LIKE '%value%'`
    pub fn like(self, column: &str, value: &str) -> Self {
        self.compare(column, "LIKE", format!("%{}%", value))
    }

    /// Prefix match, `LIKE 'value%'`
    pub fn starting(self, column: &str, value: &str) -> Self {
        self.compare(column, "LIKE", format!("{}%", value))
    }

    /// Suffix match, `LIKE '%value'`
    pub fn ending(self, column: &str, value: &str) -> Self {
        self.compare(column, "LIKE", format!("%{}", value))
    }

    /// `col IN (...)`; an empty list matches nothing.
    pub fn in_<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.membership(column, "IN", "1 = 0", values)
    }

    /// `col NOT IN (...)`; an empty list matches everything.
    pub fn not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.membership(column, "NOT IN", "1 = 1", values)
    }

    /// `value` is one of the entries of a comma separated text column.
    pub fn find_in_set(self, column: &str, value: impl Into<SqlValue>) -> Self {
        let sql = format!(
            "CONCAT(',', {}, ',') LIKE CONCAT('%,', ?, ',%')",
            quote_ident(column)
        );
        self.push(sql, vec![value.into()])
    }

    pub fn not_find_in_set(self, column: &str, value: impl Into<SqlValue>) -> Self {
        let sql = format!(
            "CONCAT(',', {}, ',') NOT LIKE CONCAT('%,', ?, ',%')",
            quote_ident(column)
        );
        self.push(sql, vec![value.into()])
    }

    /// Array column contains every value (`@>`)
    pub fn array_contains_all<I, S>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_op(column, "@>", values)
    }

    /// Array column shares at least one value (`&&`)
    pub fn array_overlaps<I, S>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_op(column, "&&", values)
    }

    /// Array column is a subset of the values (`<@`)
    pub fn array_contained_by<I, S>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_op(column, "<@", values)
    }

    /// `value = ANY(col)`
    pub fn any_equal(self, column: &str, value: impl Into<SqlValue>) -> Self {
        let sql = format!("? = ANY({})", quote_ident(column));
        self.push(sql, vec![value.into()])
    }

    /// `value <> ALL(col)`
    pub fn not_in_all(self, column: &str, value: impl Into<SqlValue>) -> Self {
        let sql = format!("? <> ALL({})", quote_ident(column));
        self.push(sql, vec![value.into()])
    }

    /// Add a raw fragment. Each `?` takes the next argument; the counts are
    /// checked when the query is built.
    pub fn where_<I, V>(self, fragment: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.push(fragment.into(), args.into_iter().map(Into::into).collect())
    }

    pub fn asc(mut self, column: &str) -> Self {
        self.orders.push((quote_ident(column), true));
        self
    }

    pub fn desc(mut self, column: &str) -> Self {
        self.orders.push((quote_ident(column), false));
        self
    }

    pub fn page(mut self, page: i64, limit: i64) -> Self {
        self.paging = Some(Paging::new(page, limit));
        self
    }

    pub fn limit(self, limit: i64) -> Self {
        self.page(1, limit)
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    fn compare(self, column: &str, op: &str, value: impl Into<SqlValue>) -> Self {
        let sql = format!("{} {} ?", quote_ident(column), op);
        self.push(sql, vec![value.into()])
    }

    fn membership<I, V>(self, column: &str, op: &str, when_empty: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let args: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return self.push(when_empty.to_owned(), Vec::new());
        }
        let placeholders = vec!["?"; args.len()].join(", ");
        let sql = format!("{} {} ({})", quote_ident(column), op, placeholders);
        self.push(sql, args)
    }

    fn array_op<I, S>(self, column: &str, op: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let sql = format!("{} {} ?::text[]", quote_ident(column), op);
        self.push(sql, vec![SqlValue::TextArray(values)])
    }

    fn push(mut self, sql: String, args: Vec<SqlValue>) -> Self {
        self.params.push(Fragment { sql, args });
        self
    }

    /// `SELECT` over `table` with filters, ordering and paging.
    pub fn build_select(&self, table: &str) -> Result<QueryBuilder<'static, Postgres>> {
        let cols = if self.select_cols.is_empty() {
            "*".to_owned()
        } else {
            self.select_cols
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", cols, quote_ident(table)));
        self.push_where(&mut builder)?;

        if !self.orders.is_empty() {
            builder.push(" ORDER BY ");
            let mut separated = builder.separated(", ");
            for (col, asc) in &self.orders {
                separated.push(format!("{} {}", col, if *asc { "ASC" } else { "DESC" }));
            }
        }

        if let Some(paging) = self.paging {
            if let Some(limit) = paging.limit() {
                builder.push(" LIMIT ");
                builder.push_bind(limit);
            }
            if let Some(offset) = paging.skip() {
                builder.push(" OFFSET ");
                builder.push_bind(offset);
            }
        }

        Ok(builder)
    }

    /// `SELECT COUNT(*)` over `table`; ordering and paging are ignored.
    pub fn build_count(&self, table: &str) -> Result<QueryBuilder<'static, Postgres>> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", quote_ident(table)));
        self.push_where(&mut builder)?;
        Ok(builder)
    }

    /// Rendered `SELECT` text with `$n` placeholders.
    pub fn to_sql(&self, table: &str) -> Result<String> {
        Ok(self.build_select(table)?.sql().to_owned())
    }

    fn push_where(&self, builder: &mut QueryBuilder<'static, Postgres>) -> Result<()> {
        for (i, fragment) in self.params.iter().enumerate() {
            let placeholders = fragment.sql.matches('?').count();
            if placeholders != fragment.args.len() {
                return Err(SqlsError::Placeholders {
                    fragment: fragment.sql.clone(),
                    placeholders,
                    args: fragment.args.len(),
                });
            }

            builder.push(if i == 0 { " WHERE " } else { " AND " });

            let mut args = fragment.args.iter().cloned();
            let mut pieces = fragment.sql.split('?').peekable();
            while let Some(piece) = pieces.next() {
                builder.push(piece);
                if pieces.peek().is_some() {
                    if let Some(arg) = args.next() {
                        arg.push_to(builder);
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn find<T>(&self, pool: &PgPool, table: &str) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut builder = self.build_select(table)?;
        tracing::debug!(sql = builder.sql(), "find");
        let rows = builder
            .build_query_as::<T>()
            .fetch_all(pool)
            .await
            .inspect_err(|e| tracing::error!(table, "find failed: {}", e))?;
        Ok(rows)
    }

    /// First matching row; the builder itself keeps its paging.
    pub async fn find_one<T>(&self, pool: &PgPool, table: &str) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut builder = self.clone().limit(1).build_select(table)?;
        let row = builder
            .build_query_as::<T>()
            .fetch_optional(pool)
            .await
            .inspect_err(|e| tracing::error!(table, "find_one failed: {}", e))?;
        Ok(row)
    }

    pub async fn count(&self, pool: &PgPool, table: &str) -> Result<i64> {
        let mut builder = self.build_count(table)?;
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .inspect_err(|e| tracing::error!(table, "count failed: {}", e))?;
        Ok(count)
    }
}

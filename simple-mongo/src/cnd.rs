//! Fluent condition builder for the document store
//!
//! Calls accumulate in order; translation (`filter`, `find_options`,
//! `pipeline`, ...) takes `&self` and can run any number of times, so one
//! `Cnd` can drive both a count and a find.
//!
//! ```
//! use simple_mongo::{bson::doc, Cnd};
//!
//! let cnd = Cnd::new()
//!     .eq("status", "active")
//!     .gte("age", 18)
//!     .desc("created_at")
//!     .page(2, 20);
//!
//! assert_eq!(cnd.filter(), doc! { "status": "active", "age": { "$gte": 18 } });
//! assert_eq!(cnd.find_options().skip, Some(20));
//! ```

use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::options::{CountOptions, FindOneOptions, FindOptions};
use mongodb::Collection;
use serde::de::DeserializeOwned;
use simple_core::Paging;

use crate::error::Result;
use crate::{field, stage};

/// One accumulated predicate
#[derive(Debug, Clone, PartialEq)]
enum Condition {
    /// Plain equality, rendered as the bare value
    Eq(Bson),
    /// Operator document such as `{ $gt: 5 }`
    Ops(Document),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cnd {
    predicates: Vec<(String, Condition)>,
    select_cols: Vec<String>,
    sort: Vec<(String, i32)>,
    paging: Option<Paging>,
}

impl Cnd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict returned fields; repeated calls extend the projection.
    pub fn cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_cols.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.predicates
            .push((column.into(), Condition::Eq(value.into())));
        self
    }

    pub fn not_eq(self, column: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.op(column, field::NE, value)
    }

    pub fn gt(self, column: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.op(column, field::GT, value)
    }

    pub fn gte(self, column: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.op(column, field::GTE, value)
    }

    pub fn lt(self, column: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.op(column, field::LT, value)
    }

    pub fn lte(self, column: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.op(column, field::LTE, value)
    }

    /// Case-insensitive regular expression match. `pattern` is used as is.
    pub fn like(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        let mut ops = Document::new();
        ops.insert(field::REGEX, pattern.into());
        ops.insert(field::OPTIONS, "i");
        self.predicates.push((column.into(), Condition::Ops(ops)));
        self
    }

    pub fn in_<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.op(column, field::IN, values)
    }

    pub fn not_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.op(column, field::NIN, values)
    }

    /// Inject a predicate verbatim. A document whose keys are all operators
    /// merges like the typed helpers; anything else is an equality match.
    pub fn where_doc(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        let condition = match value.into() {
            Bson::Document(doc) if is_operator_doc(&doc) => Condition::Ops(doc),
            other => Condition::Eq(other),
        };
        self.predicates.push((key.into(), condition));
        self
    }

    pub fn asc(mut self, column: impl Into<String>) -> Self {
        self.sort.push((column.into(), 1));
        self
    }

    pub fn desc(mut self, column: impl Into<String>) -> Self {
        self.sort.push((column.into(), -1));
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

    fn op(mut self, column: impl Into<String>, op: &str, value: impl Into<Bson>) -> Self {
        let mut ops = Document::new();
        ops.insert(op, value.into());
        self.predicates.push((column.into(), Condition::Ops(ops)));
        self
    }

    /// Native filter document.
    ///
    /// Columns keep their first-insertion position. Several predicates on
    /// the same column merge into one operator document (an earlier equality
    /// becomes `$eq`); the same operator twice keeps the last value.
    pub fn filter(&self) -> Document {
        let mut filter = Document::new();

        for (column, condition) in &self.predicates {
            let merged = match (filter.get(column), condition) {
                (None, Condition::Eq(value)) => value.clone(),
                (None, Condition::Ops(ops)) => Bson::Document(ops.clone()),
                (Some(Bson::Document(existing)), Condition::Eq(value))
                    if is_operator_doc(existing) =>
                {
                    let mut merged = existing.clone();
                    merged.insert(field::EQ, value.clone());
                    Bson::Document(merged)
                }
                (Some(_), Condition::Eq(value)) => value.clone(),
                (Some(existing), Condition::Ops(ops)) => {
                    let mut merged = match existing {
                        Bson::Document(doc) if is_operator_doc(doc) => doc.clone(),
                        other => stage::stage(field::EQ, other.clone()),
                    };
                    for (op, value) in ops {
                        merged.insert(op.clone(), value.clone());
                    }
                    Bson::Document(merged)
                }
            };
            filter.insert(column.clone(), merged);
        }

        filter
    }

    /// `{ col: 1, ... }` when columns were selected.
    pub fn projection(&self) -> Option<Document> {
        if self.select_cols.is_empty() {
            return None;
        }
        let mut projection = Document::new();
        for col in &self.select_cols {
            projection.insert(col.clone(), 1);
        }
        Some(projection)
    }

    /// Sort keys in call order, the first call being the primary key.
    pub fn sort(&self) -> Option<Document> {
        if self.sort.is_empty() {
            return None;
        }
        let mut sort = Document::new();
        for (col, direction) in &self.sort {
            sort.insert(col.clone(), *direction);
        }
        Some(sort)
    }

    pub fn find_options(&self) -> FindOptions {
        let mut opts = FindOptions::default();
        opts.projection = self.projection();
        opts.sort = self.sort();
        if let Some(paging) = self.paging {
            opts.limit = paging.limit();
            opts.skip = paging.skip().map(|skip| skip as u64);
        }
        opts
    }

    /// Like [`find_options`](Self::find_options) minus the limit; the skip is
    /// kept so `find_one` on page N returns that page's first document.
    pub fn find_one_options(&self) -> FindOneOptions {
        let mut opts = FindOneOptions::default();
        opts.projection = self.projection();
        opts.sort = self.sort();
        opts.skip = self
            .paging
            .and_then(|paging| paging.skip())
            .map(|skip| skip as u64);
        opts
    }

    /// Counting uses the filter only.
    pub fn count_options(&self) -> CountOptions {
        CountOptions::default()
    }

    /// Wrap `stages` with this condition: `$match` first, then the caller's
    /// stages, then `$sort`, `$skip` and `$limit`.
    pub fn pipeline(&self, stages: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut pipeline = Vec::new();

        let filter = self.filter();
        if !filter.is_empty() {
            pipeline.push(stage::match_(filter));
        }

        pipeline.extend(stages);

        if let Some(sort) = self.sort() {
            pipeline.push(stage::sort(sort));
        }
        if let Some(paging) = self.paging {
            if let Some(skip) = paging.skip() {
                pipeline.push(stage::skip(skip));
            }
            if let Some(limit) = paging.limit() {
                pipeline.push(stage::limit(limit));
            }
        }

        pipeline
    }

    pub async fn find<T>(&self, coll: &Collection<T>) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = coll
            .find(self.filter(), self.find_options())
            .await
            .inspect_err(|e| tracing::error!(collection = coll.name(), "find failed: {}", e))?;

        let results: Vec<T> = cursor
            .try_collect()
            .await
            .inspect_err(|e| tracing::error!(collection = coll.name(), "find cursor failed: {}", e))?;
        Ok(results)
    }

    pub async fn find_one<T>(&self, coll: &Collection<T>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let result = coll
            .find_one(self.filter(), self.find_one_options())
            .await
            .inspect_err(|e| tracing::error!(collection = coll.name(), "find_one failed: {}", e))?;
        Ok(result)
    }

    pub async fn count<T>(&self, coll: &Collection<T>) -> Result<u64>
    where
        T: Send + Sync,
    {
        let count = coll
            .count_documents(self.filter(), self.count_options())
            .await
            .inspect_err(|e| tracing::error!(collection = coll.name(), "count failed: {}", e))?;
        Ok(count)
    }

    /// Run `pipeline` as given; the accumulated condition is not applied.
    pub async fn aggregate<T, R>(
        &self,
        coll: &Collection<T>,
        pipeline: impl IntoIterator<Item = Document>,
    ) -> Result<Vec<R>>
    where
        T: Send + Sync,
        R: DeserializeOwned,
    {
        run_aggregate(coll, pipeline).await
    }

    /// Run `pipeline` wrapped by this condition, see [`pipeline`](Self::pipeline).
    pub async fn aggregate_with_conditions<T, R>(
        &self,
        coll: &Collection<T>,
        pipeline: impl IntoIterator<Item = Document>,
    ) -> Result<Vec<R>>
    where
        T: Send + Sync,
        R: DeserializeOwned,
    {
        run_aggregate(coll, self.pipeline(pipeline)).await
    }
}

pub(crate) async fn run_aggregate<T, R>(
    coll: &Collection<T>,
    pipeline: impl IntoIterator<Item = Document>,
) -> Result<Vec<R>>
where
    T: Send + Sync,
    R: DeserializeOwned,
{
    let cursor = coll
        .aggregate(pipeline, None)
        .await
        .inspect_err(|e| tracing::error!(collection = coll.name(), "aggregate failed: {}", e))?;

    let docs: Vec<Document> = cursor
        .try_collect()
        .await
        .inspect_err(|e| tracing::error!(collection = coll.name(), "aggregate cursor failed: {}", e))?;

    docs.into_iter()
        .map(|doc| bson::from_document(doc).map_err(Into::into))
        .collect()
}

fn is_operator_doc(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|key| field::is_operator(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn empty_condition_matches_all() {
        let cnd = Cnd::new();
        assert!(cnd.filter().is_empty());
        let opts = cnd.find_options();
        assert_eq!(opts.sort, None);
        assert_eq!(opts.projection, None);
        assert_eq!(opts.limit, None);
        assert_eq!(opts.skip, None);
    }

    #[test]
    fn operator_mapping_preserves_order() {
        let cnd = Cnd::new()
            .eq("a", 1)
            .not_eq("b", 2)
            .gt("c", 3)
            .gte("d", 4)
            .lt("e", 5)
            .lte("f", 6)
            .in_("g", vec![1, 2])
            .not_in("h", vec!["x"]);

        let expected = doc! {
            "a": 1,
            "b": { "$ne": 2 },
            "c": { "$gt": 3 },
            "d": { "$gte": 4 },
            "e": { "$lt": 5 },
            "f": { "$lte": 6 },
            "g": { "$in": [1, 2] },
            "h": { "$nin": ["x"] },
        };
        let filter = cnd.filter();
        assert_eq!(filter, expected);
        let keys: Vec<_> = filter.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    }

    #[test]
    fn like_is_case_insensitive_regex() {
        let cnd = Cnd::new().like("name", "^jo");
        assert_eq!(
            cnd.filter(),
            doc! { "name": { "$regex": "^jo", "$options": "i" } }
        );
    }

    #[test]
    fn range_on_same_column_merges() {
        let cnd = Cnd::new().gt("age", 18).eq("name", "x").lt("age", 65);
        assert_eq!(
            cnd.filter(),
            doc! { "age": { "$gt": 18, "$lt": 65 }, "name": "x" }
        );
    }

    #[test]
    fn equality_is_promoted_when_merged() {
        let cnd = Cnd::new().eq("status", "open").not_eq("status", "closed");
        assert_eq!(
            cnd.filter(),
            doc! { "status": { "$eq": "open", "$ne": "closed" } }
        );

        let cnd = Cnd::new().gt("n", 1).eq("n", 3);
        assert_eq!(cnd.filter(), doc! { "n": { "$gt": 1, "$eq": 3 } });
    }

    #[test]
    fn repeated_operator_keeps_last() {
        let cnd = Cnd::new().gt("n", 1).gt("n", 7);
        assert_eq!(cnd.filter(), doc! { "n": { "$gt": 7 } });
    }

    #[test]
    fn where_doc_merges_operator_documents() {
        let cnd = Cnd::new()
            .gt("score", 10)
            .where_doc("score", doc! { "$exists": true })
            .where_doc("meta", doc! { "kind": "a" });
        assert_eq!(
            cnd.filter(),
            doc! { "score": { "$gt": 10, "$exists": true }, "meta": { "kind": "a" } }
        );
    }

    #[test]
    fn sort_preserves_call_order() {
        let cnd = Cnd::new().desc("created_at").asc("name").desc("id");
        let sort = cnd.sort().unwrap();
        assert_eq!(sort, doc! { "created_at": -1, "name": 1, "id": -1 });
        let keys: Vec<_> = sort.keys().cloned().collect();
        assert_eq!(keys, vec!["created_at", "name", "id"]);
    }

    #[test]
    fn projection_from_cols() {
        let cnd = Cnd::new().cols(["name", "email"]).cols(vec!["age".to_string()]);
        assert_eq!(
            cnd.projection(),
            Some(doc! { "name": 1, "email": 1, "age": 1 })
        );
    }

    #[test]
    fn paging_translation() {
        let opts = Cnd::new().page(2, 10).find_options();
        assert_eq!(opts.limit, Some(10));
        assert_eq!(opts.skip, Some(10));

        let opts = Cnd::new().page(0, 10).find_options();
        assert_eq!(opts.limit, Some(10));
        assert_eq!(opts.skip, None);

        let opts = Cnd::new().page(1, 0).find_options();
        assert_eq!(opts.limit, None);
        assert_eq!(opts.skip, None);

        let opts = Cnd::new().limit(5).find_options();
        assert_eq!(opts.limit, Some(5));
        assert_eq!(opts.skip, None);

        let opts = Cnd::new().page(i64::MAX, 20).find_options();
        assert_eq!(opts.skip, Some(i64::MAX as u64));
    }

    #[test]
    fn find_one_keeps_skip_without_limit() {
        let opts = Cnd::new().desc("ts").page(3, 10).find_one_options();
        assert_eq!(opts.skip, Some(20));
        assert_eq!(opts.sort, Some(doc! { "ts": -1 }));
    }

    #[test]
    fn translation_is_repeatable() {
        let cnd = Cnd::new().eq("a", 1).asc("b").page(2, 5);
        assert_eq!(cnd.filter(), cnd.filter());
        assert_eq!(cnd.pipeline(vec![]), cnd.pipeline(vec![]));
    }

    #[test]
    fn pipeline_wraps_stages() {
        let cnd = Cnd::new().eq("status", "paid").desc("total").page(3, 10);
        let pipeline = cnd.pipeline(vec![stage::group(
            "$customer",
            doc! { "total": { "$sum": "$amount" } },
        )]);

        let names: Vec<_> = pipeline
            .iter()
            .map(|stage| stage.keys().next().unwrap().clone())
            .collect();
        assert_eq!(names, vec!["$match", "$group", "$sort", "$skip", "$limit"]);
        assert_eq!(pipeline[3], doc! { "$skip": 20_i64 });
        assert_eq!(pipeline[4], doc! { "$limit": 10_i64 });
    }

    #[test]
    fn pipeline_without_conditions_is_untouched() {
        let stages = vec![doc! { "$count": "n" }];
        assert_eq!(Cnd::new().pipeline(stages.clone()), stages);
    }
}

//! Typed collection wrapper running model writes through their hooks

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Cursor};
use serde::de::DeserializeOwned;

use crate::cnd::{run_aggregate, Cnd};
use crate::error::Result;
use crate::model::Model;
use crate::operation::{self, DeleteOutcome, Store, UpdateOutcome};
use crate::{field, stage};

/// A `mongodb::Collection<M>` plus the model lifecycle.
///
/// Obtained from [`MongoDb::collection`](crate::MongoDb::collection) or
/// wrapped around any driver collection with [`Coll::new`].
pub struct Coll<M: Model> {
    inner: Collection<M>,
}

impl<M: Model> Clone for Coll<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Model> Coll<M> {
    pub fn new(inner: Collection<M>) -> Self {
        Self { inner }
    }

    /// The underlying driver collection
    pub fn inner(&self) -> &Collection<M> {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn find_by_id(&self, id: impl Into<Bson>) -> Result<Option<M>> {
        self.first(by_id(id.into())).await
    }

    /// First document matching `filter`, in natural order
    pub async fn first(&self, filter: Document) -> Result<Option<M>> {
        let found = self
            .inner
            .find_one(filter, None)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "first failed: {}", e))?;
        Ok(found)
    }

    pub async fn find_all(
        &self,
        filter: Document,
        options: impl Into<Option<FindOptions>>,
    ) -> Result<Vec<M>> {
        let cursor = self
            .inner
            .find(filter, options)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "find_all failed: {}", e))?;
        let all: Vec<M> = cursor.try_collect().await.inspect_err(|e| {
            tracing::error!(collection = self.name(), "find_all cursor failed: {}", e)
        })?;
        Ok(all)
    }

    pub async fn find(&self, cnd: &Cnd) -> Result<Vec<M>> {
        cnd.find(&self.inner).await
    }

    pub async fn find_one(&self, cnd: &Cnd) -> Result<Option<M>> {
        cnd.find_one(&self.inner).await
    }

    pub async fn count(&self, cnd: &Cnd) -> Result<u64> {
        cnd.count(&self.inner).await
    }

    /// Insert `model`, generating its id first. Returns the stored id.
    pub async fn create(&self, model: &mut M) -> Result<Bson> {
        operation::create(self, model).await
    }

    /// Replace the stored document with `model`
    pub async fn update(&self, model: &mut M) -> Result<UpdateOutcome> {
        operation::update(self, model).await
    }

    /// `$set` only `fields` on the stored document
    pub async fn patch(&self, model: &mut M, fields: Document) -> Result<UpdateOutcome> {
        operation::patch(self, model, fields).await
    }

    pub async fn delete(&self, model: &mut M) -> Result<DeleteOutcome> {
        operation::delete(self, model).await
    }

    /// Run `stages` and decode every result as `R`
    pub async fn simple_aggregate<R>(&self, stages: Vec<Document>) -> Result<Vec<R>>
    where
        R: DeserializeOwned,
    {
        run_aggregate(&self.inner, stages).await
    }

    /// Run `stages` with a trailing `$limit: 1` and decode the only result
    pub async fn simple_aggregate_first<R>(&self, mut stages: Vec<Document>) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        stages.push(stage::limit(1));
        let mut results: Vec<R> = run_aggregate(&self.inner, stages).await?;
        Ok(results.pop())
    }

    /// Run `stages` and hand back the raw cursor for streaming
    pub async fn simple_aggregate_cursor(&self, stages: Vec<Document>) -> Result<Cursor<Document>> {
        let cursor = self
            .inner
            .aggregate(stages, None)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "aggregate failed: {}", e))?;
        Ok(cursor)
    }
}

#[async_trait]
impl<M: Model> Store<M> for Coll<M> {
    async fn insert(&self, model: &M) -> Result<Bson> {
        let res = self
            .inner
            .insert_one(model, None)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "insert failed: {}", e))?;
        Ok(res.inserted_id)
    }

    async fn replace(&self, id: Bson, model: &M) -> Result<UpdateOutcome> {
        let res = self
            .inner
            .replace_one(by_id(id), model, None)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "replace failed: {}", e))?;
        Ok(res.into())
    }

    async fn set_fields(&self, id: Bson, fields: Document) -> Result<UpdateOutcome> {
        let res = self
            .inner
            .update_one(by_id(id), set(fields), None)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "update failed: {}", e))?;
        Ok(res.into())
    }

    async fn remove(&self, id: Bson) -> Result<DeleteOutcome> {
        let res = self
            .inner
            .delete_one(by_id(id), None)
            .await
            .inspect_err(|e| tracing::error!(collection = self.name(), "delete failed: {}", e))?;
        Ok(res.into())
    }
}

fn by_id(id: Bson) -> Document {
    doc! { "_id": id }
}

fn set(fields: Document) -> Document {
    stage::stage(field::SET, fields)
}

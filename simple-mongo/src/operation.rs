//! Single-document writes wrapped in the model's hooks
//!
//! Sequencing lives here, storage behind [`Store`], so the same lifecycle
//! runs against a driver collection ([`Coll`](crate::Coll)) or anything else
//! that can insert, replace, patch and delete by id.
//!
//! There is no transaction around a write and its hooks: a failing
//! `after_*` hook reports an error for a write that has already landed.

use async_trait::async_trait;
use bson::{Bson, Document};
use mongodb::results::{DeleteResult, UpdateResult};

use crate::error::{Error, Result};
use crate::model::Model;

/// Matched/modified counts of an update, handed to `after_update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(res: UpdateResult) -> Self {
        Self {
            matched: res.matched_count,
            modified: res.modified_count,
        }
    }
}

/// Deleted count of a delete, handed to `after_delete`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

impl From<DeleteResult> for DeleteOutcome {
    fn from(res: DeleteResult) -> Self {
        Self {
            deleted: res.deleted_count,
        }
    }
}

/// Raw single-document storage operations keyed by `_id`
#[async_trait]
pub trait Store<M: Model>: Send + Sync {
    /// Insert and return the identifier the backend stored
    async fn insert(&self, model: &M) -> Result<Bson>;

    /// Replace the whole document
    async fn replace(&self, id: Bson, model: &M) -> Result<UpdateOutcome>;

    /// `$set` the given fields
    async fn set_fields(&self, id: Bson, fields: Document) -> Result<UpdateOutcome>;

    async fn remove(&self, id: Bson) -> Result<DeleteOutcome>;
}

pub async fn create<M, S>(store: &S, model: &mut M) -> Result<Bson>
where
    M: Model,
    S: Store<M> + ?Sized,
{
    if let Some(hooks) = model.hooks() {
        hooks.before_create().await.map_err(Error::Hook)?;
    }

    let id = model.prepare_id(model.id())?;
    model.set_id(id);

    let inserted = store.insert(model).await?;
    model.set_id(inserted.clone());
    tracing::debug!(collection = M::COLLECTION, id = %inserted, "created");

    if let Some(hooks) = model.hooks() {
        hooks.after_create().await.map_err(Error::Hook)?;
    }
    Ok(inserted)
}

pub async fn update<M, S>(store: &S, model: &mut M) -> Result<UpdateOutcome>
where
    M: Model,
    S: Store<M> + ?Sized,
{
    if let Some(hooks) = model.hooks() {
        hooks.before_update().await.map_err(Error::Hook)?;
    }

    let outcome = store.replace(model.id(), model).await?;
    tracing::debug!(collection = M::COLLECTION, matched = outcome.matched, "updated");

    if let Some(hooks) = model.hooks() {
        hooks.after_update(&outcome).await.map_err(Error::Hook)?;
    }
    Ok(outcome)
}

pub async fn patch<M, S>(store: &S, model: &mut M, fields: Document) -> Result<UpdateOutcome>
where
    M: Model,
    S: Store<M> + ?Sized,
{
    if let Some(hooks) = model.hooks() {
        hooks.before_update().await.map_err(Error::Hook)?;
    }

    let outcome = store.set_fields(model.id(), fields).await?;
    tracing::debug!(collection = M::COLLECTION, matched = outcome.matched, "patched");

    if let Some(hooks) = model.hooks() {
        hooks.after_update(&outcome).await.map_err(Error::Hook)?;
    }
    Ok(outcome)
}

pub async fn delete<M, S>(store: &S, model: &mut M) -> Result<DeleteOutcome>
where
    M: Model,
    S: Store<M> + ?Sized,
{
    if let Some(hooks) = model.hooks() {
        hooks.before_delete().await.map_err(Error::Hook)?;
    }

    let outcome = store.remove(model.id()).await?;
    tracing::debug!(collection = M::COLLECTION, deleted = outcome.deleted, "deleted");

    if let Some(hooks) = model.hooks() {
        hooks.after_delete(&outcome).await.map_err(Error::Hook)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::model::Hooks;
    use bson::doc;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    /// In-memory store recording each call
    #[derive(Default)]
    struct MemoryStore {
        docs: Mutex<Vec<(Bson, Document)>>,
        calls: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<M: Model> Store<M> for MemoryStore {
        async fn insert(&self, model: &M) -> Result<Bson> {
            self.calls.lock().unwrap().push("insert".into());
            let doc = bson::to_document(model)?;
            self.docs.lock().unwrap().push((model.id(), doc));
            Ok(model.id())
        }

        async fn replace(&self, id: Bson, model: &M) -> Result<UpdateOutcome> {
            self.calls.lock().unwrap().push("replace".into());
            let doc = bson::to_document(model)?;
            let mut docs = self.docs.lock().unwrap();
            let matched = docs.iter_mut().filter(|(k, _)| *k == id).fold(0, |n, entry| {
                entry.1 = doc.clone();
                n + 1
            });
            Ok(UpdateOutcome {
                matched,
                modified: matched,
            })
        }

        async fn set_fields(&self, id: Bson, fields: Document) -> Result<UpdateOutcome> {
            self.calls.lock().unwrap().push("set_fields".into());
            let mut docs = self.docs.lock().unwrap();
            let mut matched = 0;
            for (_, doc) in docs.iter_mut().filter(|(k, _)| *k == id) {
                for (field, value) in fields.clone() {
                    doc.insert(field, value);
                }
                matched += 1;
            }
            Ok(UpdateOutcome {
                matched,
                modified: matched,
            })
        }

        async fn remove(&self, id: Bson) -> Result<DeleteOutcome> {
            self.calls.lock().unwrap().push("remove".into());
            let mut docs = self.docs.lock().unwrap();
            let before = docs.len();
            docs.retain(|(k, _)| *k != id);
            Ok(DeleteOutcome {
                deleted: (before - docs.len()) as u64,
            })
        }
    }

    /// Model without hooks
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Plain {
        #[serde(rename = "_id")]
        id: Bson,
        name: String,
    }

    impl Model for Plain {
        const COLLECTION: &'static str = "plains";

        fn id(&self) -> Bson {
            self.id.clone()
        }

        fn set_id(&mut self, id: Bson) {
            self.id = id;
        }
    }

    /// Model recording every hook invocation
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tracked {
        #[serde(rename = "_id")]
        id: Bson,
        title: String,
        #[serde(skip)]
        seen: Vec<String>,
        #[serde(skip)]
        fail_on: Option<&'static str>,
    }

    impl Tracked {
        fn new(id: Bson) -> Self {
            Self {
                id,
                title: String::new(),
                seen: Vec::new(),
                fail_on: None,
            }
        }

        fn failing(id: Bson, hook: &'static str) -> Self {
            Self {
                fail_on: Some(hook),
                ..Self::new(id)
            }
        }

        fn record(&mut self, name: &'static str) -> std::result::Result<(), HookError> {
            self.seen.push(name.to_string());
            if self.fail_on == Some(name) {
                return Err(format!("{} refused", name).into());
            }
            Ok(())
        }
    }

    impl Model for Tracked {
        const COLLECTION: &'static str = "tracked";

        fn id(&self) -> Bson {
            self.id.clone()
        }

        fn set_id(&mut self, id: Bson) {
            self.id = id;
        }

        fn hooks(&mut self) -> Option<&mut dyn Hooks> {
            Some(self)
        }
    }

    #[async_trait]
    impl Hooks for Tracked {
        async fn before_create(&mut self) -> std::result::Result<(), HookError> {
            self.record("before_create")
        }

        async fn after_create(&mut self) -> std::result::Result<(), HookError> {
            self.record("after_create")
        }

        async fn before_update(&mut self) -> std::result::Result<(), HookError> {
            self.record("before_update")
        }

        async fn after_update(&mut self, result: &UpdateOutcome) -> std::result::Result<(), HookError> {
            self.seen.push(format!("matched={}", result.matched));
            self.record("after_update")
        }

        async fn before_delete(&mut self) -> std::result::Result<(), HookError> {
            self.record("before_delete")
        }

        async fn after_delete(&mut self, result: &DeleteOutcome) -> std::result::Result<(), HookError> {
            self.seen.push(format!("deleted={}", result.deleted));
            self.record("after_delete")
        }
    }

    #[tokio::test]
    async fn create_generates_id_and_runs_hooks_in_order() {
        let store = MemoryStore::default();
        let mut model = Tracked::new(Bson::Null);

        let id = create(&store, &mut model).await.unwrap();

        assert!(matches!(id, Bson::ObjectId(_)));
        assert_eq!(model.id, id);
        assert_eq!(model.seen, vec!["before_create", "after_create"]);
        assert_eq!(store.calls(), vec!["insert"]);
    }

    #[tokio::test]
    async fn model_without_hooks_is_a_no_op() {
        let store = MemoryStore::default();
        let mut model = Plain {
            id: Bson::String("p-1".into()),
            name: "plain".into(),
        };

        let id = create(&store, &mut model).await.unwrap();
        assert_eq!(id, Bson::String("p-1".into()));

        model.name = "renamed".into();
        let outcome = update(&store, &mut model).await.unwrap();
        assert_eq!(outcome.matched, 1);

        let outcome = delete(&store, &mut model).await.unwrap();
        assert_eq!(outcome.deleted, 1);
        assert_eq!(store.calls(), vec!["insert", "replace", "remove"]);
    }

    #[tokio::test]
    async fn before_hook_failure_skips_write() {
        let store = MemoryStore::default();
        let mut model = Tracked::failing(Bson::Null, "before_create");

        let err = create(&store, &mut model).await.unwrap_err();
        assert!(matches!(err, Error::Hook(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn after_hook_failure_leaves_record_persisted() {
        let store = MemoryStore::default();
        let mut model = Tracked::failing(Bson::Null, "after_create");

        let err = create(&store, &mut model).await.unwrap_err();
        assert!(err.to_string().contains("after_create refused"));
        assert_eq!(store.docs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_and_patch_report_outcome_to_hooks() {
        let store = MemoryStore::default();
        let mut model = Tracked::new(Bson::String("t-1".into()));
        model.title = "draft".into();
        create(&store, &mut model).await.unwrap();
        model.seen.clear();

        update(&store, &mut model).await.unwrap();
        patch(&store, &mut model, doc! { "title": "final" }).await.unwrap();

        assert_eq!(
            model.seen,
            vec![
                "before_update",
                "matched=1",
                "after_update",
                "before_update",
                "matched=1",
                "after_update",
            ]
        );
        let docs = store.docs.lock().unwrap();
        assert_eq!(docs[0].1.get_str("title").unwrap(), "final");
    }

    #[tokio::test]
    async fn delete_of_missing_document_still_runs_after_hook() {
        let store = MemoryStore::default();
        let mut model = Tracked::new(Bson::String("ghost".into()));

        let outcome = delete(&store, &mut model).await.unwrap();
        assert_eq!(outcome.deleted, 0);
        assert_eq!(model.seen, vec!["before_delete", "deleted=0", "after_delete"]);
    }
}

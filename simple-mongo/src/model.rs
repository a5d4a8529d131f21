//! Model contract and optional lifecycle hooks
//!
//! A model names its collection and indexes up front and knows how to read
//! and write its own identifier. Hooks are opt-in: a model that wants them
//! implements [`Hooks`] and returns `Some(self)` from [`Model::hooks`];
//! everyone else gets the default `None` and the hook points are skipped.
//!
//! ```
//! use simple_mongo::bson::{oid::ObjectId, Bson};
//! use simple_mongo::{async_trait, HookError, Hooks, IndexError, IndexSpec, Model};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     id: Option<ObjectId>,
//!     email: String,
//! }
//!
//! impl Model for User {
//!     const COLLECTION: &'static str = "users";
//!
//!     fn indexes() -> Result<Vec<IndexSpec>, IndexError> {
//!         Ok(vec![IndexSpec::asc("email").unique()])
//!     }
//!
//!     fn id(&self) -> Bson {
//!         self.id.map(Bson::ObjectId).unwrap_or(Bson::Null)
//!     }
//!
//!     fn set_id(&mut self, id: Bson) {
//!         self.id = id.as_object_id();
//!     }
//!
//!     fn hooks(&mut self) -> Option<&mut dyn Hooks> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl Hooks for User {
//!     async fn before_create(&mut self) -> Result<(), HookError> {
//!         self.email = self.email.to_lowercase();
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, DateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, HookError, Result};
use crate::index::{IndexError, IndexSpec};
use crate::operation::{DeleteOutcome, UpdateOutcome};

pub trait Model: Serialize + DeserializeOwned + Send + Sync + Unpin {
    /// Collection the model lives in
    const COLLECTION: &'static str;

    /// Indexes ensured at bootstrap
    fn indexes() -> std::result::Result<Vec<IndexSpec>, IndexError> {
        Ok(Vec::new())
    }

    /// Current identifier, `Bson::Null` before the first insert
    fn id(&self) -> Bson;

    fn set_id(&mut self, id: Bson);

    /// Normalise or generate the identifier before insert.
    ///
    /// The default generates an `ObjectId` for a missing id, converts a
    /// 24-character hex string into one, and keeps anything else.
    fn prepare_id(&self, id: Bson) -> Result<Bson> {
        prepare_object_id(id)
    }

    /// The model's hooks, if it has any
    fn hooks(&mut self) -> Option<&mut dyn Hooks> {
        None
    }
}

/// Before/after callbacks around single-document writes.
///
/// Every method defaults to a no-op. An error from a `before_*` hook aborts
/// the write; an error from an `after_*` hook is reported but the write has
/// already happened.
#[async_trait]
pub trait Hooks: Send {
    async fn before_create(&mut self) -> std::result::Result<(), HookError> {
        Ok(())
    }

    async fn after_create(&mut self) -> std::result::Result<(), HookError> {
        Ok(())
    }

    async fn before_update(&mut self) -> std::result::Result<(), HookError> {
        Ok(())
    }

    async fn after_update(&mut self, _result: &UpdateOutcome) -> std::result::Result<(), HookError> {
        Ok(())
    }

    async fn before_delete(&mut self) -> std::result::Result<(), HookError> {
        Ok(())
    }

    async fn after_delete(&mut self, _result: &DeleteOutcome) -> std::result::Result<(), HookError> {
        Ok(())
    }
}

/// Default identifier preparation used by [`Model::prepare_id`].
pub fn prepare_object_id(id: Bson) -> Result<Bson> {
    match id {
        Bson::Null | Bson::Undefined => Ok(Bson::ObjectId(ObjectId::new())),
        Bson::String(s) if s.is_empty() => Ok(Bson::ObjectId(ObjectId::new())),
        Bson::String(s) if s.len() == 24 => ObjectId::parse_str(&s)
            .map(Bson::ObjectId)
            .map_err(|e| Error::InvalidId(format!("{}: {}", s, e))),
        other => Ok(other),
    }
}

/// `_id` holder for models keyed by `ObjectId`.
///
/// Embed with `#[serde(flatten)]` and forward [`Model::id`] /
/// [`Model::set_id`] to [`get`](Self::get) / [`set`](Self::set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdField {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
}

impl IdField {
    pub fn get(&self) -> Bson {
        self.id.map(Bson::ObjectId).unwrap_or(Bson::Null)
    }

    /// Keeps only `ObjectId` values; anything else clears the field.
    pub fn set(&mut self, id: Bson) {
        self.id = id.as_object_id();
    }
}

/// Creation and modification timestamps.
///
/// Embed with `#[serde(flatten)]` and call [`creating`](Self::creating) /
/// [`saving`](Self::saving) from the model's hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl DateFields {
    /// Stamp both fields, keeping a `created_at` the caller already set.
    pub fn creating(&mut self) {
        let now = DateTime::now();
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }

    pub fn saving(&mut self) {
        self.updated_at = Some(DateTime::now());
    }
}

/// Owning tenant for multi-tenant collections, stored as `tenant_id`.
///
/// Embed with `#[serde(flatten)]` next to [`IdField`] and [`DateFields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdField {
    #[serde(default)]
    pub tenant_id: String,
}

impl TenantIdField {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }
}

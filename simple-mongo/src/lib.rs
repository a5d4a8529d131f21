//! simple-mongo: document-store conveniences over the `mongodb` driver
//!
//! - [`Cnd`] accumulates filter/sort/projection/paging calls and turns them
//!   into driver options or an aggregation pipeline
//! - [`Model`] + [`Hooks`] give single-document create/update/patch/delete a
//!   before/after lifecycle, driven by [`Coll`]
//! - [`connect`] pings the server and makes sure declared collections and
//!   indexes exist, returning an owned [`MongoDb`] handle
//!
//! Query execution, pooling and TLS are the driver's; errors come back
//! unchanged inside [`Error::Driver`].

pub mod cnd;
pub mod collection;
pub mod connection;
pub mod error;
pub mod field;
pub mod index;
pub mod model;
pub mod monitor;
pub mod operation;
pub mod stage;

pub use cnd::Cnd;
pub use collection::Coll;
pub use connection::{connect, CollectionSpec, MongoDb};
pub use error::{Error, HookError, Result};
pub use index::{IndexError, IndexKind, IndexSpec};
pub use model::{DateFields, Hooks, IdField, Model, TenantIdField};
pub use operation::{DeleteOutcome, Store, UpdateOutcome};

pub use async_trait::async_trait;
pub use bson;
pub use mongodb;

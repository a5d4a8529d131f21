//! Connection bootstrap
//!
//! [`connect`] turns a [`DatabaseConfig`] into a pinged client, makes sure
//! every declared collection exists with its indexes, and returns an owned
//! [`MongoDb`] handle. Every failure along the way is returned to the caller.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bson::doc;
use mongodb::options::{
    ClientOptions, Credential, ReadPreference, SelectionCriteria, Tls, TlsOptions,
};
use mongodb::{Client, Collection, Database};
use simple_core::{DatabaseConfig, TlsConfig};
use tempfile::{NamedTempFile, TempPath};

use crate::collection::Coll;
use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::model::Model;
use crate::monitor::TracingCommandMonitor;

/// Upper bound on server selection during bootstrap and later operations
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

const APP_NAME: &str = "simple-mongo";

/// A collection to ensure at bootstrap, with its indexes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub indexes: Vec<IndexSpec>,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, indexes: Vec<IndexSpec>) -> Self {
        Self {
            name: name.into(),
            indexes,
        }
    }

    /// Collection name and indexes declared by `M`
    pub fn of<M: Model>() -> Result<Self> {
        Ok(Self::new(M::COLLECTION, M::indexes()?))
    }
}

/// Connected client plus the configured database.
///
/// Cheap to clone; clones share the driver's pool.
#[derive(Debug, Clone)]
pub struct MongoDb {
    client: Client,
    database: Database,
    /// Combined client certificate + key file; removed once the last clone drops
    _tls_bundle: Option<Arc<TempPath>>,
}

impl MongoDb {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection<M: Model>(&self) -> Coll<M> {
        Coll::new(self.database.collection::<M>(M::COLLECTION))
    }

    pub fn collection_by_name<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection::<T>(name)
    }

    /// Round-trip a `ping` to the primary
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database("admin")
            .run_command(
                doc! { "ping": 1 },
                SelectionCriteria::ReadPreference(ReadPreference::Primary),
            )
            .await?;
        Ok(())
    }

    /// Create the collection when missing, then its indexes
    pub async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let existing = self
            .database
            .list_collection_names(doc! { "name": spec.name.as_str() })
            .await?;

        if existing.iter().any(|name| *name == spec.name) {
            tracing::debug!(collection = %spec.name, "collection exists");
        } else {
            self.database
                .create_collection(&spec.name, None)
                .await
                .inspect_err(|e| tracing::error!(collection = %spec.name, "create failed: {}", e))?;
            tracing::info!(collection = %spec.name, "collection created");
        }

        if !spec.indexes.is_empty() {
            let models = spec.indexes.iter().map(IndexSpec::to_model);
            self.database
                .collection::<bson::Document>(&spec.name)
                .create_indexes(models, None)
                .await
                .inspect_err(|e| {
                    tracing::error!(collection = %spec.name, "index creation failed: {}", e)
                })?;
            tracing::debug!(collection = %spec.name, count = spec.indexes.len(), "indexes ensured");
        }

        Ok(())
    }
}

/// Connect, ping and ensure `collections`.
pub async fn connect(config: &DatabaseConfig, collections: &[CollectionSpec]) -> Result<MongoDb> {
    let tls_bundle = if config.tls.is_enabled() {
        Some(Arc::new(load_tls(&config.tls)?))
    } else {
        None
    };

    let cert_key_file = tls_bundle.as_ref().map(|bundle| bundle.to_path_buf());
    let options = client_options(config, cert_key_file.as_deref()).await?;
    let client = Client::with_options(options)?;
    let database = client.database(&config.database);

    let db = MongoDb {
        client,
        database,
        _tls_bundle: tls_bundle,
    };

    db.ping()
        .await
        .inspect_err(|e| tracing::error!(address = %config.address, "ping failed: {}", e))?;
    tracing::info!(address = %config.address, database = %config.database, "connected");

    for spec in collections {
        db.ensure_collection(spec).await?;
    }

    Ok(db)
}

/// Driver options for `config`; `cert_key_file` is the combined client
/// certificate + key produced by [`load_tls`].
pub async fn client_options(
    config: &DatabaseConfig,
    cert_key_file: Option<&Path>,
) -> Result<ClientOptions> {
    let mut options = ClientOptions::parse(connection_uri(&config.address)).await?;

    options.app_name = Some(APP_NAME.to_owned());
    options.default_database = Some(config.database.clone()).filter(|db| !db.is_empty());
    options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

    if config.has_credentials() {
        options.credential = Some(
            Credential::builder()
                .username(config.account.clone())
                .password(config.password.clone())
                .build(),
        );
    }

    if let (Some(ca), Some(cert_key)) = (config.tls.ca_cert.as_ref(), cert_key_file) {
        options.tls = Some(Tls::Enabled(
            TlsOptions::builder()
                .ca_file_path(ca.clone())
                .cert_key_file_path(cert_key.to_path_buf())
                .build(),
        ));
    }

    if config.max_open_connects > 0 {
        options.max_pool_size = Some(config.max_open_connects);
    }
    if config.max_idle_connects > 0 {
        options.min_pool_size = Some(config.max_idle_connects);
    }
    options.max_idle_time = config.idle_timeout();

    options.command_event_handler = Some(Arc::new(TracingCommandMonitor));

    Ok(options)
}

/// Prefix a bare `host:port` list with the `mongodb://` scheme.
fn connection_uri(address: &str) -> String {
    if address.contains("://") {
        address.to_owned()
    } else {
        format!("mongodb://{}", address)
    }
}

/// Read and check the TLS files, then write certificate and key into one
/// PEM file the driver can load.
pub fn load_tls(tls: &TlsConfig) -> Result<TempPath> {
    let (Some(ca), Some(cert), Some(key)) = (
        tls.ca_cert.as_deref(),
        tls.client_cert.as_deref(),
        tls.client_cert_key.as_deref(),
    ) else {
        return Err(Error::tls("", "ca_cert, client_cert and client_cert_key are all required"));
    };

    read_pem(ca, "CERTIFICATE")?;
    let cert_pem = read_pem(cert, "CERTIFICATE")?;
    let key_pem = read_pem(key, "PRIVATE KEY")?;

    let mut bundle = NamedTempFile::new()?;
    bundle.write_all(cert_pem.as_bytes())?;
    if !cert_pem.ends_with('\n') {
        bundle.write_all(b"\n")?;
    }
    bundle.write_all(key_pem.as_bytes())?;
    bundle.flush()?;

    tracing::debug!(path = %bundle.path().display(), "client certificate bundle written");
    Ok(bundle.into_temp_path())
}

/// Read `path` and require a PEM block whose label contains `label`.
fn read_pem(path: &Path, label: &str) -> Result<String> {
    let pem = fs::read_to_string(path).map_err(|e| Error::tls(path, e.to_string()))?;
    let has_block = pem
        .lines()
        .any(|line| line.starts_with("-----BEGIN ") && line.contains(label));
    if !has_block {
        return Err(Error::tls(path, format!("no PEM {} block found", label)));
    }
    Ok(pem)
}

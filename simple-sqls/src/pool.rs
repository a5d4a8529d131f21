//! Connection pool bootstrap
//!
//! Builds a `PgPool` from the shared [`DatabaseConfig`] and pings it once.
//! TLS switches to `verify-full` with the configured root and client
//! certificates when all three paths are set.

use std::path::Path;

use simple_core::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use crate::error::{Result, SqlsError};

const DEFAULT_PORT: u16 = 5432;

/// Connected pool handle
#[derive(Debug, Clone)]
pub struct SqlDb {
    pool: PgPool,
}

impl SqlDb {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Open the pool and ping it.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlDb> {
    let options = connect_options(config)?;

    let pool = pool_options(config)
        .connect_with(options)
        .await
        .inspect_err(|e| tracing::error!(address = %config.address, "connect failed: {}", e))?;

    let db = SqlDb::new(pool);
    db.ping().await?;
    tracing::info!(address = %config.address, database = %config.database, "connected");
    Ok(db)
}

/// Pool sizing for `config`; zero fields keep the sqlx defaults.
pub fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    let mut options = PgPoolOptions::new();
    if config.max_open_connects > 0 {
        options = options.max_connections(config.max_open_connects);
    }
    if config.max_idle_connects > 0 {
        options = options.min_connections(config.max_idle_connects);
    }
    if let Some(timeout) = config.idle_timeout() {
        options = options.idle_timeout(timeout);
    }
    options
}

/// Connection options for `config`.
///
/// `address` is either a `postgres://` URL or `host[:port]`. The database
/// name and credentials from `config` override whatever the URL carries.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    let mut options = if config.address.contains("://") {
        config
            .address
            .parse::<PgConnectOptions>()
            .map_err(|_| SqlsError::Address(config.address.clone()))?
    } else {
        let (host, port) = split_host_port(&config.address)?;
        PgConnectOptions::new().host(host).port(port)
    };

    if !config.database.is_empty() {
        options = options.database(&config.database);
    }
    if !config.account.is_empty() {
        options = options.username(&config.account);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }

    let tls = &config.tls;
    if let (true, Some(ca), Some(cert), Some(key)) = (
        tls.is_enabled(),
        tls.ca_cert.as_deref(),
        tls.client_cert.as_deref(),
        tls.client_cert_key.as_deref(),
    ) {
        for path in [ca, cert, key] {
            require_file(path)?;
        }
        options = options
            .ssl_mode(PgSslMode::VerifyFull)
            .ssl_root_cert(ca)
            .ssl_client_cert(cert)
            .ssl_client_key(key);
    }

    Ok(options)
}

/// `host`, `host:port`, `[v6]`, `[v6]:port` or a bare IPv6 address.
fn split_host_port(address: &str) -> Result<(&str, u16)> {
    let address = address.trim();
    let invalid = || SqlsError::Address(address.to_owned());
    if address.is_empty() {
        return Err(invalid());
    }

    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        return match tail {
            "" => Ok((host, DEFAULT_PORT)),
            _ => {
                let port = tail
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(invalid)?;
                Ok((host, port))
            }
        };
    }

    match address.matches(':').count() {
        0 => Ok((address, DEFAULT_PORT)),
        1 => {
            let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
            if host.is_empty() {
                return Err(invalid());
            }
            let port = port.parse().map_err(|_| invalid())?;
            Ok((host, port))
        }
        _ => Ok((address, DEFAULT_PORT)),
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SqlsError::TlsFile(path.to_path_buf()))
    }
}

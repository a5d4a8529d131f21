//! Connection bootstrap configuration
//!
//! One `DatabaseConfig` shape serves both drivers. It is usually kept in a
//! TOML file with one table per backend:
//!
//! ```toml
//! [mongo]
//! address = "127.0.0.1:27017"
//! database = "app"
//! account = "app"
//! password = "${MONGO_PASSWORD}"
//! max_open_connects = 20
//!
//! [postgres]
//! address = "127.0.0.1:5432"
//! database = "app"
//! ```
//!
//! `${VAR}` references in string fields are expanded from the environment;
//! unset variables expand to an empty string.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("invalid var regex"));

/// Mutual-TLS material. TLS is only switched on when all three paths are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_cert_key: Option<PathBuf>,
}

impl TlsConfig {
    pub fn is_enabled(&self) -> bool {
        [&self.ca_cert, &self.client_cert, &self.client_cert_key]
            .iter()
            .all(|p| p.as_ref().is_some_and(|p| !p.as_os_str().is_empty()))
    }
}

/// Database connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `host:port` (or a comma separated seed list for the document store)
    pub address: String,
    pub database: String,
    pub account: String,
    pub password: String,
    pub tls: TlsConfig,
    /// Upper bound on pooled connections; 0 leaves the driver default
    pub max_open_connects: u32,
    /// Connections kept warm; 0 leaves the driver default
    pub max_idle_connects: u32,
    /// Seconds an idle connection may live; 0 leaves the driver default
    pub conn_max_life_time: u64,
}

impl DatabaseConfig {
    /// Parse a bare config table (no section header).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_variables(|key| env::var(key).ok());
        Ok(config)
    }

    /// Parse the `[section]` table of a larger config document.
    pub fn section_from_toml_str(content: &str, section: &str) -> Result<Self> {
        let root: toml::Table = toml::from_str(content)?;
        let table = root
            .get(section)
            .cloned()
            .ok_or_else(|| ConfigError::missing_section(section))?;

        let mut config: Self = table.try_into()?;
        config.expand_variables(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load a bare config table from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&read(path)?)?;
        tracing::debug!(path = %path.display(), address = %config.address, "database config loaded");
        Ok(config)
    }

    /// Load `[section]` from a file.
    pub fn load_section(path: impl AsRef<Path>, section: &str) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::section_from_toml_str(&read(path)?, section)?;
        tracing::debug!(path = %path.display(), section, address = %config.address, "database config loaded");
        Ok(config)
    }

    /// Idle lifetime as a `Duration`, `None` when unset.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.conn_max_life_time > 0).then(|| Duration::from_secs(self.conn_max_life_time))
    }

    /// Both halves of the credential pair are present.
    pub fn has_credentials(&self) -> bool {
        !self.account.is_empty() && !self.password.is_empty()
    }

    fn expand_variables(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.address = expand_string(&self.address, &lookup);
        self.database = expand_string(&self.database, &lookup);
        self.account = expand_string(&self.account, &lookup);
        self.password = expand_string(&self.password, &lookup);

        for path in [
            &mut self.tls.ca_cert,
            &mut self.tls.client_cert,
            &mut self.tls.client_cert_key,
        ]
        .into_iter()
        .flatten()
        {
            let expanded = expand_string(&path.display().to_string(), &lookup);
            *path = PathBuf::from(expanded);
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::io(path, source))
}

/// Expand `${var}` references in a string
fn expand_string(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    VAR_RE
        .replace_all(s, |caps: &Captures<'_>| lookup(&caps[1]).unwrap_or_default())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
        [mongo]
        address = "10.0.0.5:27017"
        database = "shop"
        account = "svc"
        password = "secret"
        max_open_connects = 20
        max_idle_connects = 5
        conn_max_life_time = 300

        [mongo.tls]
        ca_cert = "/etc/ssl/ca.pem"
        client_cert = "/etc/ssl/client.pem"
        client_cert_key = "/etc/ssl/client.key"

        [postgres]
        address = "10.0.0.6:5432"
        database = "shop"
    "#;

    #[test]
    fn parses_section() {
        let mongo = DatabaseConfig::section_from_toml_str(SAMPLE, "mongo").unwrap();
        assert_eq!(mongo.address, "10.0.0.5:27017");
        assert_eq!(mongo.max_open_connects, 20);
        assert_eq!(mongo.idle_timeout(), Some(Duration::from_secs(300)));
        assert!(mongo.tls.is_enabled());
        assert!(mongo.has_credentials());

        let pg = DatabaseConfig::section_from_toml_str(SAMPLE, "postgres").unwrap();
        assert_eq!(pg.database, "shop");
        assert!(!pg.tls.is_enabled());
        assert!(!pg.has_credentials());
        assert_eq!(pg.idle_timeout(), None);
    }

    #[test]
    fn missing_section_is_reported() {
        let err = DatabaseConfig::section_from_toml_str(SAMPLE, "redis").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));
    }

    #[test]
    fn partial_tls_is_disabled() {
        let tls = TlsConfig {
            ca_cert: Some("/ca.pem".into()),
            client_cert: None,
            client_cert_key: Some("/key.pem".into()),
        };
        assert!(!tls.is_enabled());

        let tls = TlsConfig {
            ca_cert: Some("/ca.pem".into()),
            client_cert: Some("".into()),
            client_cert_key: Some("/key.pem".into()),
        };
        assert!(!tls.is_enabled());
    }

    #[test]
    fn expands_variables() {
        let vars: HashMap<&str, &str> = [("DB_PASS", "hunter2"), ("CERTS", "/srv/certs")]
            .into_iter()
            .collect();
        let lookup = |key: &str| vars.get(key).map(|v| v.to_string());

        let mut config = DatabaseConfig {
            password: "${DB_PASS}".into(),
            account: "${UNSET_VAR}admin".into(),
            tls: TlsConfig {
                ca_cert: Some("${CERTS}/ca.pem".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        config.expand_variables(lookup);

        assert_eq!(config.password, "hunter2");
        assert_eq!(config.account, "admin");
        assert_eq!(config.tls.ca_cert, Some(PathBuf::from("/srv/certs/ca.pem")));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "address = \"localhost:27017\"\ndatabase = \"test\"\n").unwrap();
        file.flush().unwrap();

        let config = DatabaseConfig::load(file.path()).unwrap();
        assert_eq!(config.address, "localhost:27017");
        assert_eq!(config.database, "test");
        assert_eq!(config.max_open_connects, 0);
    }

    #[test]
    fn loads_section_from_file_under_debug_subscriber() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        file.flush().unwrap();

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let pg = tracing::subscriber::with_default(subscriber, || {
            DatabaseConfig::load_section(file.path(), "postgres")
        })
        .unwrap();
        assert_eq!(pg.database, "shop");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DatabaseConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

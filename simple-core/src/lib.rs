//! simple-core: pieces shared by the document-store, relational and web crates
//!
//! - [`Paging`] derives offset/limit from a page number and page size
//! - [`DatabaseConfig`] is the bootstrap configuration both drivers consume
//! - [`logging`] wires `tracing` output for binaries and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod paging;

pub use config::{DatabaseConfig, TlsConfig};
pub use error::{ConfigError, Result};
pub use paging::Paging;

//! Ministry Store - Record Store Adapter
//!
//! Narrow request/response contract between the record browser and the
//! hosted backend:
//! - [`RecordStore`]: fetch (newest first), status update, delete, create
//! - [`StoreError`]: errors tagged by operation and kind, never raw transport text
//! - [`RestStore`]: PostgREST-style backend over `reqwest`
//! - [`MemoryStore`]: in-process backend with fault injection
//! - [`StoreConfig`]: YAML configuration with environment overrides

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod memory;
pub mod rest;

pub use adapter::{sort_newest_first, Fetched, RecordStore};
pub use config::{default_config_path, ConfigError, StoreConfig, TableNames};
pub use error::{
    CreateError, DeleteError, ErrorKind, FetchError, StoreError, StoreOp, UpdateError,
};
pub use memory::MemoryStore;
pub use rest::RestStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Link Cart Core Library
//!
//! This crate provides the core functionality for Link Cart, a personal
//! bookmark collection: saving URLs with titles, tags and a favorite flag,
//! searching them, and moving them in and out as portable JSON.
//!
//! # Architecture
//!
//! - **Store**: the in-memory collection is the source of truth; every
//!   mutation is mirrored to a pluggable storage [`Backend`]
//! - **Resolver**: best-effort page title lookup with a timeout and
//!   cooperative cancellation
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = Store::open(JsonFileBackend::new(config.links_path()));
//!
//! // Add a link, looking up its title
//! let adder = Adder::new(Some(TitleResolver::from_config(&config)?));
//! adder.submit(&mut store, Draft::new("example.com"), &CancelToken::never()).await?;
//!
//! // Query links
//! let hits = store.filter(&Filter::new().tag("rust"));
//! ```
//!
//! # Modules
//!
//! - `store`: Link repository (main entry point)
//! - `add`: The add pipeline (normalize, resolve title, store)
//! - `models`: Link records and edits
//! - `normalize`: URL normalization
//! - `resolver`: Page title lookup
//! - `query`: Search and tag filtering
//! - `transfer`: JSON import and export
//! - `storage`: Storage backends
//! - `config`: Application configuration

pub mod add;
pub mod config;
pub mod models;
pub mod normalize;
pub mod query;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod transfer;

pub use add::{AddError, AddOutcome, Adder, BusyFlag, Draft};
pub use config::Config;
pub use models::{parse_tags, LinkId, LinkPatch, LinkRecord, TagPolicy};
pub use normalize::{normalize, NormalizeError};
pub use query::Filter;
pub use resolver::{cancel_pair, CancelHandle, CancelToken, Resolution, TitleResolver};
pub use storage::{Backend, JsonFileBackend, MemoryBackend, StorageError, StorageResult};
pub use store::{LookupError, Store};
pub use transfer::{export_json, parse_import, ImportPolicy, ImportReport, TransferError, EXPORT_FILE_NAME};

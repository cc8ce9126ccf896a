//! filedb - embedded single-file JSON document store
//!
//! Documents live in memory and are written back to one JSON file after
//! mutations settle for a configurable interval.

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod persistence;
pub mod query;
pub mod storage;
pub mod store;
pub mod value;

pub use config::Config;
pub use database::{Database, DatabaseBuilder};
pub use error::{StoreError, StoreResult};
pub use events::{Event, EventBus, EventKind, ListenerId};
pub use query::{FindOptions, Query, Sort, SortOrder};
pub use storage::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use value::{Document, Value};

//! # Founder store for hierarchical allele-code nomenclature
//!
//! - `store` - the in-memory founder pool, indexed by `(level, ancestor prefix)`
//! - `snapshot` - gzip'd JSON form of the pool
//! - `persist` - store directory layout, atomic saves and the run lock
//! - `changelog` - append-only log of renamed codes

pub mod changelog;
pub mod errors;
pub mod persist;
pub mod snapshot;
pub mod store;

pub use changelog::{ChangeLogEntry, ChangeReason};
pub use errors::StoreError;
pub use persist::{StoreLayout, StoreLock, load_store, save_store};
pub use store::{FounderStore, RecordId};

//! # Storage Service
//!
//! Durable storage for the rich-text editor.
//!
//! ## Philosophy
//!
//! **The store is a dumb byte map; meaning lives above it.**
//!
//! The host medium offers only `get`, `set` and `delete`. Everything the
//! editor persists goes through one versionless record, the [`Snapshot`],
//! written under a single fixed key.
//!
//! ## Design
//!
//! - **KeyValueStore**: the host medium contract
//! - **MemoryStore / FileStore**: in-memory and directory-backed media
//! - **FailingStore**: failure injection for save-path tests
//! - **PersistenceStore**: snapshot save/load/clear over any medium

pub mod failing_store;
pub mod persistence;
pub mod store;

pub use failing_store::{FailingStore, FailurePolicy};
pub use persistence::{
    deserialize_snapshot, serialize_snapshot, PersistenceError, PersistenceResult,
    PersistenceStore, Snapshot, DEFAULT_DOCUMENT_KEY,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};

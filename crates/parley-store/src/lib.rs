//! # Parley Store
//!
//! Persistence for parley.
//!
//! - [`KeyValueStore`]: string key/value capability (memory and file backends)
//! - [`RecordStore`]: contact records keyed by contact identifier
//! - [`TranslationStore`]: translation cache with expiry plus per-message
//!   history, written through to a [`KeyValueStore`]

pub mod error;
pub mod kv;
pub mod records;
pub mod translation;

pub use error::StoreError;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use records::{ContactRecord, FileRecordStore, MemoryRecordStore, RecordStore, SavedMessage};
pub use translation::{CacheEntry, CacheStats, HistoryEntry, StoreOptions, TranslationStore};

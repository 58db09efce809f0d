//! Translation cache and history.
//!
//! The cache maps exact source text to its translation and expires entries
//! after a fixed TTL. History maps a message key to the translation last shown
//! for it and never expires. Both are held in memory and written through to a
//! [`KeyValueStore`] on every change. Persistence failures are logged and
//! swallowed: the in-memory maps stay authoritative for the session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use parley_config::CacheConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::kv::KeyValueStore;

/// Cached translation of one source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub translation: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Translation last displayed for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub original_text: String,
    pub translated_text: String,
    pub timestamp: i64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub valid: usize,
    pub expired: usize,
}

/// Where and how long a [`TranslationStore`] keeps its data.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Persisted key of the cache map.
    pub cache_key: String,
    /// Persisted key of the history map; `None` disables history.
    pub history_key: Option<String>,
    pub ttl: Duration,
}

impl StoreOptions {
    /// Message-direction options: cache plus history.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            cache_key: config.cache_key.clone(),
            history_key: Some(config.history_key.clone()),
            ttl: config.ttl(),
        }
    }

    /// Cache-only options under a separate key.
    pub fn cache_only(cache_key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache_key: cache_key.into(),
            history_key: None,
            ttl,
        }
    }
}

/// Translation cache and history store.
pub struct TranslationStore {
    kv: Arc<dyn KeyValueStore>,
    options: StoreOptions,
    cache: RwLock<HashMap<String, CacheEntry>>,
    history: RwLock<HashMap<String, HistoryEntry>>,
    /// Serializes write-through so the last write always carries the newest snapshot.
    persist_lock: Mutex<()>,
    /// Expired entries dropped while opening.
    purged_on_open: usize,
}

impl TranslationStore {
    /// Load both maps from `kv` and purge expired cache entries.
    ///
    /// Unreadable or corrupt persisted data starts the map empty.
    pub async fn open(kv: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let cache = load_map::<CacheEntry>(kv.as_ref(), &options.cache_key).await;
        let history = match &options.history_key {
            Some(key) => load_map::<HistoryEntry>(kv.as_ref(), key).await,
            None => HashMap::new(),
        };

        info!(
            "Translation store opened: {} cached, {} history entries",
            cache.len(),
            history.len()
        );

        let mut store = Self {
            kv,
            options,
            cache: RwLock::new(cache),
            history: RwLock::new(history),
            persist_lock: Mutex::new(()),
            purged_on_open: 0,
        };
        store.purged_on_open = store.purge_expired().await;
        store
    }

    /// How many expired entries [`TranslationStore::open`] removed.
    pub fn purged_on_open(&self) -> usize {
        self.purged_on_open
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Cached translation of `text`, if present and not expired.
    ///
    /// An expired entry is removed on the way out.
    pub async fn lookup(&self, text: &str) -> Option<String> {
        let now = now_millis();
        let expired = {
            let cache = self.cache.read();
            match cache.get(text) {
                None => return None,
                Some(entry) if !self.is_expired(entry, now) => {
                    return Some(entry.translation.clone());
                }
                Some(_) => true,
            }
        };

        if expired {
            let removed = self.cache.write().remove(text).is_some();
            if removed {
                debug!("Expired cache entry dropped: {}", text);
                self.persist_cache().await;
            }
        }
        None
    }

    /// Upsert a cache entry with a fresh timestamp.
    pub async fn store(&self, text: &str, translation: &str) {
        self.cache.write().insert(
            text.to_string(),
            CacheEntry {
                translation: translation.to_string(),
                timestamp: now_millis(),
            },
        );
        self.persist_cache().await;
    }

    /// Record the translation displayed for a message.
    pub async fn record_history(&self, key: &str, original: &str, translated: &str) {
        if self.options.history_key.is_none() {
            return;
        }
        self.history.write().insert(
            key.to_string(),
            HistoryEntry {
                original_text: original.to_string(),
                translated_text: translated.to_string(),
                timestamp: now_millis(),
            },
        );
        self.persist_history().await;
    }

    pub fn get_history(&self, key: &str) -> Option<HistoryEntry> {
        self.history.read().get(key).cloned()
    }

    /// Remove every expired cache entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = now_millis();
        let removed = {
            let mut cache = self.cache.write();
            let before = cache.len();
            cache.retain(|_, entry| !self.is_expired(entry, now));
            before - cache.len()
        };

        if removed > 0 {
            info!("Purged {} expired cache entries", removed);
            self.persist_cache().await;
        }
        removed
    }

    /// Drop every cache entry, in memory and persisted. History is kept.
    pub async fn clear_cache(&self) {
        self.cache.write().clear();
        let _guard = self.persist_lock.lock().await;
        if let Err(e) = self.kv.remove(&self.options.cache_key).await {
            warn!("Failed to remove persisted cache: {}", e);
        }
        info!("Translation cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        let now = now_millis();
        let cache = self.cache.read();
        let expired = cache
            .values()
            .filter(|entry| self.is_expired(entry, now))
            .count();
        CacheStats {
            size: cache.len(),
            valid: cache.len() - expired,
            expired,
        }
    }

    /// Number of cache entries, expired ones included.
    pub fn size(&self) -> usize {
        self.cache.read().len()
    }

    pub fn history_size(&self) -> usize {
        self.history.read().len()
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        let ttl = i64::try_from(self.options.ttl.as_millis()).unwrap_or(i64::MAX);
        entry.timestamp <= now.saturating_sub(ttl)
    }

    async fn persist_cache(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = serde_json::to_string(&*self.cache.read());
        write_snapshot(self.kv.as_ref(), &self.options.cache_key, snapshot).await;
    }

    async fn persist_history(&self) {
        let Some(key) = &self.options.history_key else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let snapshot = serde_json::to_string(&*self.history.read());
        write_snapshot(self.kv.as_ref(), key, snapshot).await;
    }
}

async fn write_snapshot(
    kv: &dyn KeyValueStore,
    key: &str,
    snapshot: Result<String, serde_json::Error>,
) {
    let json = match snapshot {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize '{}': {}", key, e);
            return;
        }
    };
    if let Err(e) = kv.set(key, &json).await {
        warn!("Failed to persist '{}': {}", key, e);
    }
}

async fn load_map<T: for<'de> Deserialize<'de>>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> HashMap<String, T> {
    match kv.get(key).await {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(map) => map,
            Err(e) => {
                warn!("Discarding corrupt '{}': {}", key, e);
                HashMap::new()
            }
        },
        Ok(None) => HashMap::new(),
        Err(e) => {
            warn!("Failed to load '{}': {}", key, e);
            HashMap::new()
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
#[path = "translation_tests.rs"]
mod tests;

//! Store construction and shared paths for parley.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use parley_config::{Config, ConfigLoader, StorageBackend, StorageConfig};
use parley_store::{
    FileKeyValueStore, FileRecordStore, KeyValueStore, MemoryKeyValueStore, MemoryRecordStore,
    RecordStore, StoreError, StoreOptions, TranslationStore,
};

/// Get the .parley directory path.
pub(crate) fn parley_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".parley"))
        .unwrap_or_else(|| PathBuf::from(".parley"))
}

/// Persistence capabilities selected by `[storage]`.
pub(crate) struct Stores {
    pub kv: Arc<dyn KeyValueStore>,
    pub records: Arc<dyn RecordStore>,
}

impl Stores {
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Self {
                    kv: Arc::new(MemoryKeyValueStore::new()),
                    records: Arc::new(MemoryRecordStore::new()),
                })
            }
            StorageBackend::File => {
                let path = PathBuf::from(ConfigLoader::expand_path(&config.path));
                info!("Using file storage at {:?}", path);
                Ok(Self {
                    kv: Arc::new(FileKeyValueStore::new(&path).await?),
                    records: Arc::new(FileRecordStore::new(&path).await?),
                })
            }
        }
    }

    /// Cache and history of inbound messages.
    pub async fn message_store(&self, config: &Config) -> Arc<TranslationStore> {
        Arc::new(TranslationStore::open(self.kv.clone(), StoreOptions::from_config(&config.cache)).await)
    }

    /// Cache of compose-box translations, under its own key and without history.
    pub async fn input_store(&self, config: &Config) -> Arc<TranslationStore> {
        let options = StoreOptions::cache_only(config.input.cache_key.clone(), config.cache.ttl());
        Arc::new(TranslationStore::open(self.kv.clone(), options).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::File;
        config.storage.path = dir.path().display().to_string();
        config
    }

    #[tokio::test]
    async fn test_file_stores_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);

        let stores = Stores::open(&config.storage).await.unwrap();
        stores.message_store(&config).await.store("hola", "你好").await;
        stores.input_store(&config).await.store("谢谢", "Thanks").await;

        let reopened = Stores::open(&config.storage).await.unwrap();
        let messages = reopened.message_store(&config).await;
        let input = reopened.input_store(&config).await;
        assert_eq!(messages.lookup("hola").await.as_deref(), Some("你好"));
        assert_eq!(messages.lookup("谢谢").await, None);
        assert_eq!(input.lookup("谢谢").await.as_deref(), Some("Thanks"));
    }

    #[tokio::test]
    async fn test_memory_stores_start_empty() {
        let config = Config::default();
        let stores = Stores::open(&config.storage).await.unwrap();

        assert_eq!(stores.message_store(&config).await.size(), 0);
        assert!(stores.records.get_all().await.unwrap().is_empty());
    }
}

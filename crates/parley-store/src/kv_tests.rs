use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_memory_store_set_get_remove() {
    let store = MemoryKeyValueStore::new();
    assert_eq!(store.get("flag").await.unwrap(), None);

    store.set("flag", "true").await.unwrap();
    assert_eq!(store.get("flag").await.unwrap().as_deref(), Some("true"));

    store.set("flag", "false").await.unwrap();
    assert_eq!(store.get("flag").await.unwrap().as_deref(), Some("false"));

    store.remove("flag").await.unwrap();
    assert_eq!(store.get("flag").await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();
        store.set("translation_cache", "{\"a\":1}").await.unwrap();
    }

    let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();
    assert_eq!(
        store.get("translation_cache").await.unwrap().as_deref(),
        Some("{\"a\":1}")
    );
}

#[tokio::test]
async fn test_file_store_missing_key() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

    assert_eq!(store.get("nothing").await.unwrap(), None);
    store.remove("nothing").await.unwrap();
}

#[tokio::test]
async fn test_file_store_remove() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

    store.set("k", "v").await.unwrap();
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_file_store_sanitizes_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileKeyValueStore::new(temp_dir.path()).await.unwrap();

    store.set("../escape", "v").await.unwrap();
    assert!(temp_dir.path().join("kv").join("___escape.json").exists());
    assert_eq!(store.get("../escape").await.unwrap().as_deref(), Some("v"));
}

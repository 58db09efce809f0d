//! Structured contact record persistence.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;

/// A message saved against a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMessage {
    pub text: String,

    /// Inline image data URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Messages saved for one contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Contact identifier (a phone number on the host app).
    pub contact_id: String,
    pub messages: Vec<SavedMessage>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRecord {
    pub fn new(contact_id: impl Into<String>, messages: Vec<SavedMessage>) -> Self {
        Self {
            contact_id: contact_id.into(),
            messages,
            updated_at: Utc::now(),
        }
    }
}

/// Record store keyed by contact identifier.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load one contact's record.
    async fn get(&self, contact_id: &str) -> Result<Option<ContactRecord>, StoreError>;

    /// Insert or replace a record.
    async fn put(&self, record: &ContactRecord) -> Result<(), StoreError>;

    /// All records, ordered by contact identifier.
    async fn get_all(&self) -> Result<Vec<ContactRecord>, StoreError>;

    /// Remove every record.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<String, ContactRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, contact_id: &str) -> Result<Option<ContactRecord>, StoreError> {
        Ok(self.records.read().await.get(contact_id).cloned())
    }

    async fn put(&self, record: &ContactRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.contact_id.clone(), record.clone());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ContactRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.write().await.clear();
        Ok(())
    }
}

/// File system record store.
///
/// ```text
/// {storage_path}/
/// └── contacts/
///     └── {contact_id}.json
/// ```
pub struct FileRecordStore {
    storage_path: PathBuf,
}

impl FileRecordStore {
    /// Open the store, creating its directory if needed.
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(storage_path.join("contacts")).await?;

        debug!("FileRecordStore initialized at {:?}", storage_path);

        Ok(Self { storage_path })
    }

    fn contacts_dir(&self) -> PathBuf {
        self.storage_path.join("contacts")
    }

    fn record_path(&self, contact_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !contact_id.is_empty()
            && contact_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Storage(format!(
                "Invalid contact id: {:?}",
                contact_id
            )));
        }
        Ok(self.contacts_dir().join(format!("{}.json", contact_id)))
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get(&self, contact_id: &str) -> Result<Option<ContactRecord>, StoreError> {
        let path = self.record_path(contact_id)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn put(&self, record: &ContactRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.contact_id)?;
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&path, content).await?;

        debug!("Saved contact '{}' to {:?}", record.contact_id, path);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ContactRecord>, StoreError> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(self.contacts_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<ContactRecord>(&content) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Failed to deserialize contact from {:?}: {}", path, e),
                },
                Err(e) => warn!("Failed to read contact file {:?}: {}", path, e),
            }
        }

        records.sort_by(|a, b| a.contact_id.cmp(&b.contact_id));
        Ok(records)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = fs::read_dir(self.contacts_dir()).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }

        debug!("Cleared {} contact records", removed);
        Ok(())
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;

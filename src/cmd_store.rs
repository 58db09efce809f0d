//! Translate, cache, history and contacts subcommands for parley.

use std::path::Path;

use tracing::info;

use parley_config::Config;
use parley_core::history_key;
use parley_store::{ContactRecord, TranslationStore};

use crate::cli::{CacheAction, ContactsAction, HistoryAction};
use crate::stores::Stores;

/// Translate one text, cache first.
pub(crate) async fn handle_translate(
    config: &Config,
    text: &str,
    input: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(&config.storage).await?;
    let (store, source, target) = if input {
        (stores.input_store(config).await, &config.input.source_lang, &config.input.target_lang)
    } else {
        (
            stores.message_store(config).await,
            &config.translation.source_lang,
            &config.translation.target_lang,
        )
    };

    let text = text.trim();
    if let Some(cached) = store.lookup(text).await {
        info!("Cache hit");
        println!("{}", cached);
        return Ok(());
    }

    let translator = parley_translate::build_translator(&config.translation)?;
    let translated = translator.translate(text, source, target).await?;
    if !translated.is_empty() {
        store.store(text, &translated).await;
    }
    println!("{}", translated);
    Ok(())
}

/// Handle cache subcommands.
pub(crate) async fn handle_cache_command(
    config: &Config,
    action: CacheAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(&config.storage).await?;
    let messages = stores.message_store(config).await;
    let input = stores.input_store(config).await;

    match action {
        CacheAction::Stats => {
            let m = messages.cache_stats();
            let i = input.cache_stats();
            println!("{:<10} {:>8} {:>8} {:>8}", "CACHE", "SIZE", "VALID", "EXPIRED");
            println!("{:<10} {:>8} {:>8} {:>8}", "messages", m.size, m.valid, m.expired);
            println!("{:<10} {:>8} {:>8} {:>8}", "input", i.size, i.valid, i.expired);
            println!("History entries: {}", messages.history_size());
        }
        CacheAction::Purge => {
            let purged = purged_count(&messages).await + purged_count(&input).await;
            println!("Purged {} expired entries", purged);
        }
        CacheAction::Clear { input: clear_input } => {
            if clear_input {
                input.clear_cache().await;
                println!("Compose-box cache cleared");
            } else {
                messages.clear_cache().await;
                println!("Message cache cleared");
            }
        }
    }
    Ok(())
}

/// Expired entries removed from `store`, counting those dropped when it was opened.
async fn purged_count(store: &TranslationStore) -> usize {
    store.purged_on_open() + store.purge_expired().await
}

/// Handle history subcommands.
pub(crate) async fn handle_history_command(
    config: &Config,
    action: HistoryAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(&config.storage).await?;
    let messages = stores.message_store(config).await;

    match action {
        HistoryAction::Get { text } => {
            let key = history_key(&text);
            match messages.get_history(&key) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                None => println!("No history for {}", key),
            }
        }
    }
    Ok(())
}

/// Handle contacts subcommands.
pub(crate) async fn handle_contacts_command(
    config: &Config,
    action: ContactsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(&config.storage).await?;
    let records = stores.records;

    match action {
        ContactsAction::List { format } => {
            let all = records.get_all().await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&all)?);
                return Ok(());
            }
            if all.is_empty() {
                println!("No saved contacts");
                return Ok(());
            }
            println!("{:<20} {:>8}  {}", "CONTACT", "MESSAGES", "UPDATED");
            for record in all {
                println!(
                    "{:<20} {:>8}  {}",
                    record.contact_id,
                    record.messages.len(),
                    record.updated_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        ContactsAction::Show { contact_id } => match records.get(&contact_id).await? {
            Some(record) => {
                for message in &record.messages {
                    println!("{}", message.text);
                    if !message.images.is_empty() {
                        println!("  ({} images)", message.images.len());
                    }
                }
            }
            None => println!("Contact not found: {}", contact_id),
        },
        ContactsAction::Import { file } => {
            let imported = import_contacts(records.as_ref(), &file).await?;
            println!("Imported {} contacts", imported);
        }
        ContactsAction::Clear => {
            records.clear().await?;
            println!("All contacts cleared");
        }
    }
    Ok(())
}

async fn import_contacts(
    records: &dyn parley_store::RecordStore,
    file: &Path,
) -> Result<usize, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(file).await?;
    let imported: Vec<ContactRecord> = serde_json::from_str(&content)?;
    for record in &imported {
        records.put(record).await?;
    }
    info!("Imported {} contact records from {:?}", imported.len(), file);
    Ok(imported.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use parley_store::{KeyValueStore, MemoryKeyValueStore, StoreOptions};

    #[tokio::test]
    async fn test_purge_counts_entries_dropped_on_open() {
        let config = Config::default();
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set(
            &config.cache.cache_key,
            r#"{"old":{"translation":"stale","timestamp":1},"older":{"translation":"stale","timestamp":0}}"#,
        )
        .await
        .unwrap();

        let store = TranslationStore::open(kv, StoreOptions::from_config(&config.cache)).await;

        assert_eq!(purged_count(&store).await, 2);
        assert_eq!(store.size(), 0);
    }
}

//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub selectors: SelectorsConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote translation endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Endpoint of the translate call.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Source language for inbound messages (`auto` lets the endpoint infer it).
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Target language for inbound messages.
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Client-side timeout per remote call attempt.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after a failed remote call (0 = no retry).
    #[serde(default)]
    pub retry_attempts: u32,

    /// Fixed delay between retry attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_target_lang() -> String {
    "zh-CN".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

/// Translation cache and history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache entries older than this are treated as absent.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Persistence key of the source-text cache.
    #[serde(default = "default_cache_key")]
    pub cache_key: String,

    /// Persistence key of the per-message history.
    #[serde(default = "default_history_key")]
    pub history_key: String,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            cache_key: default_cache_key(),
            history_key: default_history_key(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_cache_key() -> String {
    "translation_cache".to_string()
}

fn default_history_key() -> String {
    "translation_history".to_string()
}

/// Translation queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Items dispatched concurrently per drain batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between drain batches.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Elements redisplayed per reapplication batch.
    #[serde(default = "default_reapply_batch_size")]
    pub reapply_batch_size: usize,

    /// Pause between reapplication batches.
    #[serde(default = "default_reapply_batch_delay_ms")]
    pub reapply_batch_delay_ms: u64,
}

impl QueueConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn reapply_batch_delay(&self) -> Duration {
        Duration::from_millis(self.reapply_batch_delay_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            batch_delay_ms: default_batch_delay_ms(),
            reapply_batch_size: default_reapply_batch_size(),
            reapply_batch_delay_ms: default_reapply_batch_delay_ms(),
        }
    }
}

fn default_concurrency() -> usize {
    3
}

fn default_batch_delay_ms() -> u64 {
    200
}

fn default_reapply_batch_size() -> usize {
    10
}

fn default_reapply_batch_delay_ms() -> u64 {
    50
}

/// Mutation watcher and conversation-switch timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Quiet period after a conversation switch before reapplying and resuming.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay before reapplying after translation is switched back on.
    #[serde(default = "default_enable_reapply_delay_ms")]
    pub enable_reapply_delay_ms: u64,

    /// Quiet period after the last scroll before rescanning.
    #[serde(default = "default_scroll_debounce_ms")]
    pub scroll_debounce_ms: u64,
}

impl WatcherConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn enable_reapply_delay(&self) -> Duration {
        Duration::from_millis(self.enable_reapply_delay_ms)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            enable_reapply_delay_ms: default_enable_reapply_delay_ms(),
            scroll_debounce_ms: default_scroll_debounce_ms(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    1_000
}

fn default_enable_reapply_delay_ms() -> u64 {
    500
}

fn default_scroll_debounce_ms() -> u64 {
    100
}

/// Compose-box translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Enabled state used when nothing has been persisted yet.
    #[serde(default)]
    pub enabled_by_default: bool,

    #[serde(default = "default_input_source_lang")]
    pub source_lang: String,

    #[serde(default = "default_input_target_lang")]
    pub target_lang: String,

    /// Pause between serial queue items.
    #[serde(default = "default_queue_delay_ms")]
    pub queue_delay_ms: u64,

    /// Lifetime of a transient hint.
    #[serde(default = "default_hint_duration_ms")]
    pub hint_duration_ms: u64,

    /// Persistence key of the enabled flag.
    #[serde(default = "default_enabled_key")]
    pub enabled_key: String,

    /// Persistence key of the compose-direction cache.
    #[serde(default = "default_input_cache_key")]
    pub cache_key: String,
}

impl InputConfig {
    pub fn queue_delay(&self) -> Duration {
        Duration::from_millis(self.queue_delay_ms)
    }

    pub fn hint_duration(&self) -> Duration {
        Duration::from_millis(self.hint_duration_ms)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: false,
            source_lang: default_input_source_lang(),
            target_lang: default_input_target_lang(),
            queue_delay_ms: default_queue_delay_ms(),
            hint_duration_ms: default_hint_duration_ms(),
            enabled_key: default_enabled_key(),
            cache_key: default_input_cache_key(),
        }
    }
}

fn default_input_source_lang() -> String {
    "zh-CN".to_string()
}

fn default_input_target_lang() -> String {
    "en".to_string()
}

fn default_queue_delay_ms() -> u64 {
    500
}

fn default_hint_duration_ms() -> u64 {
    3_000
}

fn default_enabled_key() -> String {
    "input_translator_enabled".to_string()
}

fn default_input_cache_key() -> String {
    "input_translation_cache".to_string()
}

/// Selector lists describing the host page. Alternatives are tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    /// Root the mutation watcher subscribes to.
    #[serde(default = "default_app_root")]
    pub app_root: Vec<String>,

    /// Scrollable container holding the visible conversation.
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,

    /// Message elements.
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,

    /// Text-bearing descendants of a message element.
    #[serde(default = "default_text")]
    pub text: Vec<String>,

    /// Elements whose mutation signals a conversation switch.
    #[serde(default = "default_conversation_roots")]
    pub conversation_roots: Vec<String>,

    /// Compose box of the outbound message.
    #[serde(default = "default_compose_box")]
    pub compose_box: Vec<String>,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            app_root: default_app_root(),
            containers: default_containers(),
            messages: default_messages(),
            text: default_text(),
            conversation_roots: default_conversation_roots(),
            compose_box: default_compose_box(),
        }
    }
}

fn default_app_root() -> Vec<String> {
    vec!["#app".to_string(), "body".to_string()]
}

fn default_containers() -> Vec<String> {
    vec![
        r#"div[data-testid="conversation-panel-messages"]"#.to_string(),
        "#main div.message-list".to_string(),
        ".conversation-panel-messages".to_string(),
    ]
}

fn default_messages() -> Vec<String> {
    vec![
        "div.message-in, div.message-out".to_string(),
        r#"[data-testid="msg-container"]"#.to_string(),
    ]
}

fn default_text() -> Vec<String> {
    vec![
        r#"div.copyable-text span[dir="ltr"]"#.to_string(),
        r#"[data-testid="msg-text"]"#.to_string(),
        ".message-text".to_string(),
    ]
}

fn default_conversation_roots() -> Vec<String> {
    vec![
        r#"div[data-testid="conversation-panel-wrapper"]"#.to_string(),
        "#main".to_string(),
        ".conversation-panel".to_string(),
    ]
}

fn default_compose_box() -> Vec<String> {
    vec![r#"div[contenteditable="true"][aria-label="输入消息"]"#.to_string()]
}

/// Persistence backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory of the file backend (`~` is expanded).
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "~/.parley/store".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

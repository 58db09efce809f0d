//! Compose-box translation.
//!
//! Enter on a compose box holding Han text is intercepted and the text goes
//! through a serial queue: cache first, then the remote call, then the result
//! is written back into the compose box for the user to send. A failure only
//! shows a hint; the original text stays in place and can be sent as is.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use parley_config::InputConfig;
use parley_core::HostSelectors;
use parley_dom::{HostDocument, NodeId, NodeSpec};
use parley_store::{KeyValueStore, TranslationStore};
use parley_translate::{Translator, contains_han, is_shortcut_command};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::QueueError;
use crate::hint::{HintKind, HintSink};

/// A key press on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: "Enter".to_string(),
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        Self {
            key: "Enter".to_string(),
            shift: true,
        }
    }
}

/// What the host should do with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Let the host handle it.
    PassThrough,
    /// Swallow it; the text was queued for translation.
    Intercept,
}

/// Status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputStatus {
    pub running: bool,
    pub enabled: bool,
    pub queue_length: usize,
    pub is_processing: bool,
}

struct InputItem {
    compose: NodeId,
    text: String,
}

#[derive(Default)]
struct InputState {
    items: VecDeque<InputItem>,
    processing: bool,
    enabled: bool,
    running: bool,
}

struct Inner {
    doc: Arc<dyn HostDocument>,
    selectors: Arc<HostSelectors>,
    store: Arc<TranslationStore>,
    flags: Arc<dyn KeyValueStore>,
    translator: Arc<dyn Translator>,
    hints: Arc<dyn HintSink>,
    config: InputConfig,
    state: Mutex<InputState>,
}

/// Serial translation queue for outbound text.
#[derive(Clone)]
pub struct InputQueue {
    inner: Arc<Inner>,
}

impl InputQueue {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        doc: Arc<dyn HostDocument>,
        selectors: Arc<HostSelectors>,
        store: Arc<TranslationStore>,
        flags: Arc<dyn KeyValueStore>,
        translator: Arc<dyn Translator>,
        hints: Arc<dyn HintSink>,
        config: InputConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                doc,
                selectors,
                store,
                flags,
                translator,
                hints,
                config,
                state: Mutex::new(InputState::default()),
            }),
        }
    }

    /// Start handling keys, restoring the persisted enabled flag.
    pub async fn start(&self) {
        let enabled = match self.inner.flags.get(&self.inner.config.enabled_key).await {
            Ok(Some(value)) => value == "true",
            Ok(None) => self.inner.config.enabled_by_default,
            Err(e) => {
                warn!("Failed to read input translator flag: {}", e);
                false
            }
        };

        let mut state = self.inner.state.lock();
        state.running = true;
        state.enabled = enabled;
        info!("Input translator started (enabled: {})", enabled);
    }

    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.running = false;
        state.enabled = false;
        info!("Input translator stopped");
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Flip the enabled flag and persist it. Returns the new value.
    pub async fn toggle_enabled(&self) -> bool {
        let enabled = {
            let mut state = self.inner.state.lock();
            state.enabled = !state.enabled;
            state.enabled
        };
        self.persist_enabled(enabled).await;
        info!("Input translation {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.inner.state.lock().enabled = enabled;
        self.persist_enabled(enabled).await;
    }

    pub fn status(&self) -> InputStatus {
        let state = self.inner.state.lock();
        InputStatus {
            running: state.running,
            enabled: state.enabled,
            queue_length: state.items.len(),
            is_processing: state.processing,
        }
    }

    /// Decide what to do with a key press whose target is `target`.
    ///
    /// Only Enter without Shift on a compose box holding Han text is
    /// intercepted. Quick-reply commands always pass through.
    pub fn handle_key(&self, target: NodeId, key: &KeyPress) -> KeyAction {
        {
            let state = self.inner.state.lock();
            if !state.running || !state.enabled {
                return KeyAction::PassThrough;
            }
        }

        let doc = self.inner.doc.as_ref();
        let Some(compose) = self.compose_box_of(target) else {
            return KeyAction::PassThrough;
        };
        let text = doc
            .text_content(compose)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if is_shortcut_command(&text) {
            return KeyAction::PassThrough;
        }
        if key.key == "Enter" && !key.shift && !text.is_empty() && contains_han(&text) {
            self.submit(compose, text);
            return KeyAction::Intercept;
        }
        KeyAction::PassThrough
    }

    /// Queue `text` for translation into `compose`.
    pub fn submit(&self, compose: NodeId, text: String) {
        let mut state = self.inner.state.lock();
        state.items.push_back(InputItem { compose, text });
        debug!("Input translation queued, queue length: {}", state.items.len());

        if !state.processing {
            state.processing = true;
            tokio::spawn(Inner::process_queue(self.inner.clone()));
        }
    }

    /// Cache first, then the remote call. Writes the cache on success.
    pub async fn translate_text(&self, text: &str) -> Result<String, QueueError> {
        self.inner.translate_text(text).await
    }

    fn compose_box_of(&self, target: NodeId) -> Option<NodeId> {
        let doc = self.inner.doc.as_ref();
        let mut current = Some(target);
        while let Some(node) = current {
            if self.inner.selectors.compose_box.matches(doc, node) {
                return Some(node);
            }
            current = doc.parent(node);
        }
        None
    }

    async fn persist_enabled(&self, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.inner.flags.set(&self.inner.config.enabled_key, value).await {
            warn!("Failed to persist input translator flag: {}", e);
        }
    }
}

impl Inner {
    async fn process_queue(self: Arc<Self>) {
        loop {
            let item = {
                let mut state = self.state.lock();
                match state.items.pop_front() {
                    Some(item) => item,
                    None => {
                        state.processing = false;
                        break;
                    }
                }
            };

            match self.translate_text(&item.text).await {
                Ok(translated) if !translated.is_empty() && translated != item.text => {
                    if self.write_back(item.compose, &translated) {
                        self.hints.show(HintKind::Translation, "Translation complete");
                    } else {
                        debug!("Compose box {} is gone", item.compose);
                    }
                }
                Ok(_) => debug!("Input translation empty or unchanged"),
                Err(e) => {
                    warn!("Input translation failed: {}", e);
                    self.hints.show(HintKind::Error, "Translation failed");
                }
            }

            tokio::time::sleep(self.config.queue_delay()).await;
        }
    }

    async fn translate_text(&self, text: &str) -> Result<String, QueueError> {
        if let Some(cached) = self.store.lookup(text).await {
            debug!("Input cache hit");
            return Ok(cached);
        }
        let translated = self
            .translator
            .translate(text, &self.config.source_lang, &self.config.target_lang)
            .await?;
        if !translated.is_empty() {
            self.store.store(text, &translated).await;
        }
        Ok(translated)
    }

    /// Replace the compose box paragraph's content with `text`.
    fn write_back(&self, compose: NodeId, text: &str) -> bool {
        let doc = self.doc.as_ref();
        if !doc.is_connected(compose) {
            return false;
        }

        let paragraph = doc
            .descendants(compose)
            .into_iter()
            .find(|node| doc.tag_name(*node).as_deref() == Some("p"));
        let Some(paragraph) = paragraph else {
            return doc.set_text_content(compose, text);
        };

        for child in doc.children(paragraph) {
            doc.remove_node(child);
        }
        let span = NodeSpec::element("span")
            .class("selectable-text copyable-text")
            .attr("data-lexical-text", "true")
            .text(text);
        doc.append_element(paragraph, &span).is_some()
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;

//! Fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_config::CacheConfig;
use parley_dom::NodeId;
use parley_store::{MemoryKeyValueStore, StoreOptions, TranslationStore};
use parley_translate::{TranslateError, Translator};
use parley_workqueue::{QueueError, QueueOptions, TranslationDisplay, TranslationQueue};

/// Translator answering `<text>` unless told otherwise, counting calls.
#[derive(Default)]
pub struct FakeTranslator {
    translations: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    fn id(&self) -> &str {
        "fake"
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
        self.calls.lock().push(text.to_string());
        Ok(self
            .translations
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("<{}>", text)))
    }
}

/// Display recording what it shows, with a configurable reapply list.
#[derive(Default)]
pub struct RecordingDisplay {
    shown: Mutex<Vec<(NodeId, String)>>,
    pending: Mutex<Vec<(NodeId, String)>>,
}

impl RecordingDisplay {
    pub fn shown(&self) -> Vec<(NodeId, String)> {
        self.shown.lock().clone()
    }

    pub fn set_pending(&self, pending: Vec<(NodeId, String)>) {
        *self.pending.lock() = pending;
    }
}

impl TranslationDisplay for RecordingDisplay {
    fn display(&self, node: NodeId, translated: &str) -> Result<(), QueueError> {
        self.shown.lock().push((node, translated.to_string()));
        Ok(())
    }

    fn clear_all(&self) -> usize {
        let mut shown = self.shown.lock();
        let n = shown.len();
        shown.clear();
        n
    }

    fn pending_reapply(&self) -> Vec<(NodeId, String)> {
        self.pending.lock().clone()
    }
}

pub struct QueueHarness {
    pub queue: TranslationQueue,
    pub translator: Arc<FakeTranslator>,
    pub display: Arc<RecordingDisplay>,
    pub store: Arc<TranslationStore>,
}

/// A started queue over in-memory fakes.
pub async fn queue_harness() -> QueueHarness {
    let translator = Arc::new(FakeTranslator::default());
    let display = Arc::new(RecordingDisplay::default());
    let store = Arc::new(
        TranslationStore::open(
            Arc::new(MemoryKeyValueStore::new()),
            StoreOptions::from_config(&CacheConfig::default()),
        )
        .await,
    );
    let queue = TranslationQueue::new(
        store.clone(),
        translator.clone(),
        display.clone(),
        QueueOptions {
            batch_delay: Duration::from_millis(200),
            ..QueueOptions::default()
        },
    );
    queue.start();
    QueueHarness {
        queue,
        translator,
        display,
        store,
    }
}

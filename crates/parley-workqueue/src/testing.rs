//! Fakes shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_dom::NodeId;
use parley_translate::{TranslateError, Translator};
use tokio::sync::Semaphore;

use crate::display::TranslationDisplay;
use crate::error::QueueError;
use crate::hint::{HintKind, HintSink};

/// Translator returning `<text>` unless told otherwise.
pub struct FakeTranslator {
    translations: HashMap<String, String>,
    failing: HashSet<String>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self {
            translations: HashMap::new(),
            failing: HashSet::new(),
            gate: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, translated: &str) -> Self {
        self.translations.insert(text.to_string(), translated.to_string());
        self
    }

    pub fn failing(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Every call waits for a permit on [`FakeTranslator::gate`].
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn gate(&self) -> Arc<Semaphore> {
        self.gate.clone().unwrap_or_else(|| Arc::new(Semaphore::new(0)))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    fn id(&self) -> &str {
        "fake"
    }

    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, TranslateError> {
        self.calls.lock().push(text.to_string());
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(TranslateError::Network("connection reset".to_string()));
        }
        Ok(self
            .translations
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("<{}>", text)))
    }
}

/// Display that records what it was asked to show.
#[derive(Default)]
pub struct RecordingDisplay {
    shown: Mutex<Vec<(NodeId, String)>>,
    detached: Mutex<HashSet<NodeId>>,
    pending: Mutex<Vec<(NodeId, String)>>,
}

impl RecordingDisplay {
    pub fn shown(&self) -> Vec<(NodeId, String)> {
        self.shown.lock().clone()
    }

    pub fn detach(&self, node: NodeId) {
        self.detached.lock().insert(node);
    }

    pub fn set_pending(&self, pending: Vec<(NodeId, String)>) {
        *self.pending.lock() = pending;
    }
}

impl TranslationDisplay for RecordingDisplay {
    fn display(&self, node: NodeId, translated: &str) -> Result<(), QueueError> {
        if self.detached.lock().contains(&node) {
            return Err(QueueError::Detached(node));
        }
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

/// Hint sink that records shown hints.
#[derive(Default)]
pub struct RecordingHints {
    shown: Mutex<Vec<(HintKind, String)>>,
}

impl RecordingHints {
    pub fn shown(&self) -> Vec<(HintKind, String)> {
        self.shown.lock().clone()
    }
}

impl HintSink for RecordingHints {
    fn show(&self, kind: HintKind, message: &str) {
        self.shown.lock().push((kind, message.to_string()));
    }
}

/// Poll `condition` until it holds, failing the test after a while.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

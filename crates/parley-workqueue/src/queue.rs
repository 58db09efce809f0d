//! Translation queue engine.
//!
//! Items drain in batches of `concurrency`, all requests of a batch in flight
//! at once, with a fixed delay between batches. Normal enqueues append to the
//! tail; high-priority enqueues insert at the head, so among high-priority
//! items the most recent drains first.
//!
//! At most one drain loop exists at a time. The loop checks the paused flag
//! before taking each batch and exits when paused or empty; `resume` starts a
//! new loop if work remains. Neither `pause` nor `clear` cancels requests
//! already in flight.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use parley_config::{QueueConfig, TranslationConfig};
use parley_core::MessageRecord;
use parley_store::TranslationStore;
use parley_translate::Translator;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::display::TranslationDisplay;
use crate::error::QueueError;
use crate::item::{Outcome, QueueItem};

/// Tunables of a [`TranslationQueue`].
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub concurrency: usize,
    pub batch_delay: Duration,
    pub reapply_batch_size: usize,
    pub reapply_batch_delay: Duration,
    pub source_lang: String,
    pub target_lang: String,
}

impl QueueOptions {
    pub fn from_config(queue: &QueueConfig, translation: &TranslationConfig) -> Self {
        Self {
            concurrency: queue.concurrency.max(1),
            batch_delay: queue.batch_delay(),
            reapply_batch_size: queue.reapply_batch_size.max(1),
            reapply_batch_delay: queue.reapply_batch_delay(),
            source_lang: translation.source_lang.clone(),
            target_lang: translation.target_lang.clone(),
        }
    }
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default(), &TranslationConfig::default())
    }
}

/// Status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub running: bool,
    pub queue_length: usize,
    /// A drain loop is active.
    pub is_processing: bool,
    pub paused: bool,
    pub cache_size: usize,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub drains_started: u64,
    pub displayed: u64,
    pub from_history: u64,
    pub failed: u64,
}

#[derive(Default)]
struct QueueState {
    items: VecDeque<QueueItem>,
    draining: bool,
    paused: bool,
    running: bool,
}

#[derive(Default)]
struct Counters {
    drains_started: AtomicU64,
    displayed: AtomicU64,
    from_history: AtomicU64,
    failed: AtomicU64,
}

struct Inner {
    state: Mutex<QueueState>,
    store: Arc<TranslationStore>,
    translator: Arc<dyn Translator>,
    display: Arc<dyn TranslationDisplay>,
    options: QueueOptions,
    counters: Counters,
}

/// Handle to the translation queue. Clones share the same queue.
#[derive(Clone)]
pub struct TranslationQueue {
    inner: Arc<Inner>,
}

impl TranslationQueue {
    pub fn new(
        store: Arc<TranslationStore>,
        translator: Arc<dyn Translator>,
        display: Arc<dyn TranslationDisplay>,
        options: QueueOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                store,
                translator,
                display,
                options,
                counters: Counters::default(),
            }),
        }
    }

    /// Append to the tail.
    pub fn enqueue(&self, record: MessageRecord) {
        let mut state = self.inner.state.lock();
        state.items.push_back(QueueItem::new(record));
        debug!("Enqueued translation, queue length: {}", state.items.len());
        self.maybe_start_drain(&mut state);
    }

    /// Insert at the head.
    pub fn enqueue_high_priority(&self, record: MessageRecord) {
        let mut state = self.inner.state.lock();
        state.items.push_front(QueueItem::new(record));
        debug!("Enqueued high-priority translation, queue length: {}", state.items.len());
        self.maybe_start_drain(&mut state);
    }

    /// Discard pending items. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let mut state = self.inner.state.lock();
        let discarded = state.items.len();
        state.items.clear();
        info!("Translation queue cleared, {} pending items discarded", discarded);
        discarded
    }

    /// Stop taking new batches.
    pub fn pause(&self) {
        self.inner.state.lock().paused = true;
        info!("Translation queue paused");
    }

    /// Allow draining again and start a loop if work remains.
    pub fn resume(&self) {
        let mut state = self.inner.state.lock();
        state.paused = false;
        self.maybe_start_drain(&mut state);
        info!("Translation queue resumed, {} pending", state.items.len());
    }

    pub fn start(&self) {
        self.inner.state.lock().running = true;
        info!("Translation queue started");
    }

    /// Discard pending items and clear the paused flag.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        state.items.clear();
        state.paused = false;
        state.running = false;
        info!("Translation queue stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.inner.state.lock();
        QueueStatus {
            running: state.running,
            queue_length: state.items.len(),
            is_processing: state.draining,
            paused: state.paused,
            cache_size: self.inner.store.size(),
        }
    }

    pub fn stats(&self) -> QueueStats {
        let c = &self.inner.counters;
        QueueStats {
            drains_started: c.drains_started.load(Ordering::SeqCst),
            displayed: c.displayed.load(Ordering::SeqCst),
            from_history: c.from_history.load(Ordering::SeqCst),
            failed: c.failed.load(Ordering::SeqCst),
        }
    }

    pub fn store(&self) -> &Arc<TranslationStore> {
        &self.inner.store
    }

    pub fn display(&self) -> &Arc<dyn TranslationDisplay> {
        &self.inner.display
    }

    /// Run one message through the pipeline outside the queue.
    pub async fn translate_now(&self, record: &MessageRecord) -> Result<Outcome, QueueError> {
        self.inner.process(record).await
    }

    /// Redisplay recorded translations on messages that lost their annotation.
    ///
    /// Works in batches with a short pause between them. Does nothing while
    /// the queue is stopped. Returns how many annotations were restored.
    pub async fn reapply_all(&self) -> usize {
        if !self.is_running() {
            return 0;
        }

        let pending = self.inner.display.pending_reapply();
        let size = self.inner.options.reapply_batch_size.max(1);
        let mut restored = 0;

        for (index, batch) in pending.chunks(size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.inner.options.reapply_batch_delay).await;
            }
            for (node, text) in batch {
                let Some(entry) = self.inner.store.get_history(&parley_core::history_key(text)) else {
                    continue;
                };
                match self.inner.display.display(*node, &entry.translated_text) {
                    Ok(()) => restored += 1,
                    Err(e) => debug!("Reapply skipped: {}", e),
                }
            }
        }

        info!("Reapplied {} of {} translations", restored, pending.len());
        restored
    }

    fn maybe_start_drain(&self, state: &mut QueueState) {
        if state.draining || state.paused || state.items.is_empty() {
            return;
        }
        state.draining = true;
        self.inner.counters.drains_started.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(Inner::drain(self.inner.clone()));
    }
}

impl Inner {
    async fn drain(self: Arc<Self>) {
        info!("Translation drain started, {} pending", self.state.lock().items.len());

        loop {
            let batch: Vec<QueueItem> = {
                let mut state = self.state.lock();
                if state.paused || state.items.is_empty() {
                    state.draining = false;
                    break;
                }
                let n = self.options.concurrency.min(state.items.len());
                state.items.drain(..n).collect()
            };

            let results = join_all(batch.iter().map(|item| self.process(&item.record))).await;
            for (item, result) in batch.iter().zip(results) {
                if let Err(e) = result {
                    self.counters.failed.fetch_add(1, Ordering::SeqCst);
                    warn!("Translation of {} failed: {}", item.record.fingerprint, e);
                }
            }

            tokio::time::sleep(self.options.batch_delay).await;
        }

        info!("Translation drain finished");
    }

    /// History, then cache, then the remote call. Results equal to the source
    /// are neither recorded nor shown.
    async fn process(&self, record: &MessageRecord) -> Result<Outcome, QueueError> {
        let text = record.text.trim();
        if text.is_empty() {
            return Ok(Outcome::Skipped);
        }

        let key = record.history_key();
        if let Some(entry) = self.store.get_history(&key) {
            debug!("History hit for {}", key);
            return match self.display.display(record.node, &entry.translated_text) {
                Ok(()) => {
                    self.counters.from_history.fetch_add(1, Ordering::SeqCst);
                    Ok(Outcome::FromHistory)
                }
                Err(QueueError::Detached(_)) => Ok(Outcome::Stale),
                Err(e) => Err(e),
            };
        }

        let translated = match self.store.lookup(text).await {
            Some(cached) => {
                debug!("Cache hit for {}", key);
                cached
            }
            None => {
                let translated = self
                    .translator
                    .translate(text, &self.options.source_lang, &self.options.target_lang)
                    .await?;
                if !translated.is_empty() {
                    self.store.store(text, &translated).await;
                }
                translated
            }
        };

        if translated.trim().is_empty() || translated == text {
            debug!("Translation of {} is empty or unchanged", key);
            return Ok(Outcome::Unchanged);
        }

        self.store.record_history(&key, text, &translated).await;

        match self.display.display(record.node, &translated) {
            Ok(()) => {
                self.counters.displayed.fetch_add(1, Ordering::SeqCst);
                Ok(Outcome::Displayed)
            }
            Err(QueueError::Detached(node)) => {
                debug!("Element {} left the document before display", node);
                Ok(Outcome::Stale)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

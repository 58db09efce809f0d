//! Session controller.
//!
//! Wires the watcher, the switch coordinator and the translation queue
//! together and exposes the operations the page-level UI drives: start and
//! stop, the translation toggle, scroll rescans and marker resets.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use parley_config::WatcherConfig;
use parley_core::{MessageExtractor, markers::PROCESSED_ATTR};
use parley_dom::{HostDocument, NodeId};
use parley_workqueue::TranslationQueue;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coordinator::{SwitchCoordinator, SwitchPhase};
use crate::error::WatchError;
use crate::event::WatchEvent;
use crate::watcher::MessageWatcher;

/// Status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub running: bool,
    pub translation_enabled: bool,
    pub watching: bool,
    pub phase: SwitchPhase,
    pub queue_length: usize,
    pub is_processing: bool,
    pub paused: bool,
    pub cache_size: usize,
}

#[derive(Default)]
struct SessionState {
    running: bool,
    translation_enabled: bool,
    events: Option<JoinHandle<()>>,
    scroll: Option<CancellationToken>,
    reapply: Option<CancellationToken>,
}

struct Inner {
    doc: Arc<dyn HostDocument>,
    extractor: MessageExtractor,
    watcher: MessageWatcher,
    queue: TranslationQueue,
    coordinator: SwitchCoordinator,
    config: WatcherConfig,
    state: Mutex<SessionState>,
}

/// Message translation for one page.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(
        doc: Arc<dyn HostDocument>,
        extractor: MessageExtractor,
        queue: TranslationQueue,
        config: WatcherConfig,
    ) -> Self {
        let watcher = MessageWatcher::new(doc.clone(), extractor.clone());
        let coordinator = SwitchCoordinator::new(queue.clone(), config.settle_delay());
        Self {
            inner: Arc::new(Inner {
                doc,
                extractor,
                watcher,
                queue,
                coordinator,
                config,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Start the queue and the watcher, then scan the messages already on
    /// the page. Returns how many were queued by the initial scan.
    pub fn start(&self) -> Result<usize, WatchError> {
        if self.inner.state.lock().running {
            return Ok(0);
        }

        self.inner.queue.start();
        let events = self.inner.watcher.subscribe();
        if let Err(e) = self.inner.watcher.start() {
            self.inner.queue.stop();
            return Err(e);
        }

        let handle = tokio::spawn(Inner::pump(Arc::downgrade(&self.inner), events));
        {
            let mut state = self.inner.state.lock();
            state.running = true;
            state.translation_enabled = true;
            state.events = Some(handle);
        }

        let queued = self.inner.scan_visible();
        info!("Session started, {} existing messages queued", queued);
        Ok(queued)
    }

    /// Stop watching and discard pending work. Annotations stay in place.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if !state.running {
            return;
        }
        state.running = false;
        if let Some(handle) = state.events.take() {
            handle.abort();
        }
        cancel(&mut state.scroll);
        cancel(&mut state.reapply);
        drop(state);

        self.inner.watcher.stop();
        self.inner.coordinator.cancel();
        self.inner.queue.stop();
        info!("Session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    pub fn is_translation_enabled(&self) -> bool {
        self.inner.state.lock().translation_enabled
    }

    /// Turn message translation off or back on.
    ///
    /// Off stops the queue and removes every annotation. On restarts the
    /// queue and, after a short delay, reapplies recorded translations and
    /// queues messages that arrived while it was off.
    pub fn set_translation_enabled(&self, enabled: bool) {
        let mut state = self.inner.state.lock();
        state.translation_enabled = enabled;
        cancel(&mut state.reapply);

        if !enabled {
            drop(state);
            self.inner.queue.stop();
            let removed = self.inner.queue.display().clear_all();
            info!("Message translation disabled, {} annotations removed", removed);
            return;
        }

        self.inner.queue.start();
        let token = CancellationToken::new();
        state.reapply = Some(token.clone());
        drop(state);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(inner.config.enable_reapply_delay()) => {
                    inner.queue.reapply_all().await;
                    let queued = inner.scan_visible();
                    debug!("Post-enable scan queued {} messages", queued);
                }
            }
        });
        info!("Message translation enabled");
    }

    /// Flip the translation toggle. Returns the new value.
    pub fn toggle_translation(&self) -> bool {
        let enabled = !self.is_translation_enabled();
        self.set_translation_enabled(enabled);
        enabled
    }

    /// Forward a conversation switch noticed outside the watcher.
    pub fn on_conversation_changed(&self) {
        self.inner.coordinator.on_conversation_changed();
    }

    /// Rescan the visible conversation once scrolling has been quiet for a
    /// while. Earlier pending rescans are dropped.
    pub fn on_scroll(&self) {
        let mut state = self.inner.state.lock();
        if !state.running {
            return;
        }
        cancel(&mut state.scroll);
        let token = CancellationToken::new();
        state.scroll = Some(token.clone());
        drop(state);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(inner.config.scroll_debounce()) => {
                    let queued = inner.scan_visible();
                    debug!("Scroll rescan queued {} messages", queued);
                }
            }
        });
    }

    /// Scan the visible conversation now and queue unprocessed messages.
    pub fn rescan(&self) -> usize {
        self.inner.scan_visible()
    }

    /// Forget which messages were processed. Returns how many markers were cleared.
    pub fn reset_markers(&self) -> usize {
        let doc = self.inner.doc.as_ref();
        let cleared = self.inner.extractor.reset_markers(doc, doc.root());
        info!("Reset {} processed markers", cleared);
        cleared
    }

    /// Watch again after the app root was replaced.
    pub fn restart_watcher(&self) -> Result<NodeId, WatchError> {
        self.inner.watcher.restart()
    }

    pub fn status(&self) -> SessionStatus {
        let (running, translation_enabled) = {
            let state = self.inner.state.lock();
            (state.running, state.translation_enabled)
        };
        let queue = self.inner.queue.status();
        SessionStatus {
            running,
            translation_enabled,
            watching: self.inner.watcher.is_active(),
            phase: self.inner.coordinator.phase(),
            queue_length: queue.queue_length,
            is_processing: queue.is_processing,
            paused: queue.paused,
            cache_size: queue.cache_size,
        }
    }

    pub fn queue(&self) -> &TranslationQueue {
        &self.inner.queue
    }

    pub fn coordinator(&self) -> &SwitchCoordinator {
        &self.inner.coordinator
    }
}

impl Inner {
    async fn pump(session: Weak<Inner>, mut events: mpsc::UnboundedReceiver<WatchEvent>) {
        while let Some(event) = events.recv().await {
            let Some(inner) = session.upgrade() else {
                break;
            };
            inner.handle(event);
        }
        debug!("Session event pump finished");
    }

    fn handle(&self, event: WatchEvent) {
        match event {
            WatchEvent::ConversationChanged => self.coordinator.on_conversation_changed(),
            WatchEvent::NewMessage(record) => {
                if self.accepting() {
                    self.queue.enqueue_high_priority(record);
                } else {
                    // Unmark so a later scan picks it up.
                    self.doc.remove_attribute(record.node, PROCESSED_ATTR);
                    debug!("Translation off, message {} left for a later scan", record.fingerprint);
                }
            }
        }
    }

    fn accepting(&self) -> bool {
        let state = self.state.lock();
        state.running && state.translation_enabled && self.queue.is_running()
    }

    /// Scan the message container, or the whole app when there is none, and
    /// queue what was found at normal priority.
    fn scan_visible(&self) -> usize {
        if !self.accepting() {
            return 0;
        }

        let doc = self.doc.as_ref();
        let root = self
            .extractor
            .message_container(doc)
            .or_else(|| self.extractor.app_root(doc))
            .unwrap_or_else(|| doc.root());

        let records = self.extractor.scan(doc, root);
        let queued = records.len();
        for record in records {
            self.queue.enqueue(record);
        }
        queued
    }
}

fn cancel(token: &mut Option<CancellationToken>) {
    if let Some(token) = token.take() {
        token.cancel();
    }
}

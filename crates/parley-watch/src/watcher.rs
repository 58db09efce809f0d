//! Mutation watcher.
//!
//! Subscribes to change batches under the app root and turns each batch into
//! [`WatchEvent`]s. There is at most one subscriber; subscribing again
//! replaces it. When the root leaves the document the watcher logs and goes
//! inert until [`MessageWatcher::restart`] is called against a new root.

use std::sync::Arc;

use parking_lot::Mutex;
use parley_core::MessageExtractor;
use parley_dom::{HostDocument, MutationRecord, MutationStream, NodeId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::WatchError;
use crate::event::WatchEvent;

struct WatchTask {
    root: NodeId,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    doc: Arc<dyn HostDocument>,
    extractor: MessageExtractor,
    subscriber: Mutex<Option<mpsc::UnboundedSender<WatchEvent>>>,
}

/// Watches the host document for new messages and conversation switches.
pub struct MessageWatcher {
    inner: Arc<Inner>,
    task: Mutex<Option<WatchTask>>,
}

impl MessageWatcher {
    pub fn new(doc: Arc<dyn HostDocument>, extractor: MessageExtractor) -> Self {
        Self {
            inner: Arc::new(Inner {
                doc,
                extractor,
                subscriber: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Receive events from now on. Replaces any earlier subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<WatchEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.inner.subscriber.lock().replace(tx).is_some() {
            debug!("Previous watcher subscriber replaced");
        }
        rx
    }

    /// Locate the app root and start watching it. A running watch is
    /// stopped first. Returns the watched root.
    pub fn start(&self) -> Result<NodeId, WatchError> {
        self.stop();

        let doc = self.inner.doc.as_ref();
        let root = self
            .inner
            .extractor
            .app_root(doc)
            .ok_or(WatchError::RootNotFound)?;
        let stream = doc.observe(root)?;

        let token = CancellationToken::new();
        let handle = tokio::spawn(Inner::run(self.inner.clone(), stream, token.clone()));
        *self.task.lock() = Some(WatchTask { root, token, handle });

        info!("Message watcher started on {}", root);
        Ok(root)
    }

    /// Watch again after the previous root went away.
    pub fn restart(&self) -> Result<NodeId, WatchError> {
        info!("Restarting message watcher");
        self.start()
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.token.cancel();
            info!("Message watcher stopped");
        }
    }

    /// Whether batches are still being received.
    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Root of the current watch, if one was started.
    pub fn root(&self) -> Option<NodeId> {
        self.task.lock().as_ref().map(|task| task.root)
    }

    /// Turn one batch into events without dispatching them.
    pub fn classify(&self, batch: &[MutationRecord]) -> Vec<WatchEvent> {
        self.inner.classify(batch)
    }
}

impl Drop for MessageWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Inner {
    async fn run(self: Arc<Self>, mut stream: MutationStream, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = stream.recv() => match next {
                    Some(batch) => self.dispatch(&batch),
                    None => {
                        warn!("Watched root left the document, watcher inert until restarted");
                        break;
                    }
                },
            }
        }
    }

    fn dispatch(&self, batch: &[MutationRecord]) {
        let events = self.classify(batch);
        if events.is_empty() {
            return;
        }

        let mut subscriber = self.subscriber.lock();
        let Some(tx) = subscriber.as_ref() else {
            debug!("No watcher subscriber, {} events dropped", events.len());
            return;
        };
        for event in events {
            if tx.send(event).is_err() {
                debug!("Watcher subscriber went away");
                *subscriber = None;
                return;
            }
        }
    }

    /// A batch switches conversation when a changed node is a conversation
    /// root. Messages come from scanning every added subtree, in record order.
    fn classify(&self, batch: &[MutationRecord]) -> Vec<WatchEvent> {
        let doc = self.doc.as_ref();
        let is_root = |node: NodeId| {
            doc.is_connected(node) && self.extractor.is_conversation_root(doc, node)
        };

        let switched = batch
            .iter()
            .any(|record| is_root(record.target) || record.added.iter().any(|node| is_root(*node)));

        let mut events = Vec::new();
        if switched {
            events.push(WatchEvent::ConversationChanged);
        }

        for record in batch {
            for added in &record.added {
                if !doc.is_connected(*added) || doc.tag_name(*added).is_none() {
                    continue;
                }
                events.extend(
                    self.extractor
                        .scan(doc, *added)
                        .into_iter()
                        .map(WatchEvent::NewMessage),
                );
            }
        }

        if !events.is_empty() {
            debug!("Mutation batch of {} records produced {} events", batch.len(), events.len());
        }
        events
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;

//! Conversation-switch coordination.
//!
//! A switch pauses and clears the translation queue at once, so nothing from
//! the previous conversation is requested afterwards. After a quiet period the
//! recorded translations are reapplied to the new view and the queue resumes.
//! Switches arriving during the quiet period restart it; only the last one
//! settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use parley_workqueue::TranslationQueue;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPhase {
    Stable,
    SwitchPending,
}

struct CoordinatorState {
    phase: SwitchPhase,
    pending: Option<CancellationToken>,
    generation: u64,
}

struct Inner {
    queue: TranslationQueue,
    settle_delay: Duration,
    state: Mutex<CoordinatorState>,
    switches: AtomicU64,
    settled: AtomicU64,
}

/// Reacts to conversation switches on behalf of the translation queue.
#[derive(Clone)]
pub struct SwitchCoordinator {
    inner: Arc<Inner>,
}

impl SwitchCoordinator {
    pub fn new(queue: TranslationQueue, settle_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue,
                settle_delay,
                state: Mutex::new(CoordinatorState {
                    phase: SwitchPhase::Stable,
                    pending: None,
                    generation: 0,
                }),
                switches: AtomicU64::new(0),
                settled: AtomicU64::new(0),
            }),
        }
    }

    /// Pause and clear the queue now, then settle after the quiet period.
    pub fn on_conversation_changed(&self) {
        let queue = &self.inner.queue;
        queue.pause();
        let discarded = queue.clear();
        self.inner.switches.fetch_add(1, Ordering::SeqCst);
        info!("Conversation switch detected, {} pending translations discarded", discarded);

        let token = CancellationToken::new();
        let generation = {
            let mut state = self.inner.state.lock();
            if let Some(previous) = state.pending.replace(token.clone()) {
                previous.cancel();
                debug!("Pending settle superseded");
            }
            state.phase = SwitchPhase::SwitchPending;
            state.generation += 1;
            state.generation
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(inner.settle_delay) => inner.settle(generation).await,
            }
        });
    }

    /// Drop any pending settle and return to `Stable` without resuming.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
        state.generation += 1;
        state.phase = SwitchPhase::Stable;
    }

    pub fn phase(&self) -> SwitchPhase {
        self.inner.state.lock().phase
    }

    /// Switches seen so far.
    pub fn switch_count(&self) -> u64 {
        self.inner.switches.load(Ordering::SeqCst)
    }

    /// Settles completed so far.
    pub fn settle_count(&self) -> u64 {
        self.inner.settled.load(Ordering::SeqCst)
    }
}

impl Inner {
    async fn settle(&self, generation: u64) {
        let restored = self.queue.reapply_all().await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!("Newer switch arrived during reapply, leaving the queue paused");
            return;
        }
        state.pending = None;
        state.phase = SwitchPhase::Stable;
        self.queue.resume();
        self.settled.fetch_add(1, Ordering::SeqCst);
        info!("Conversation settled, {} translations reapplied", restored);
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

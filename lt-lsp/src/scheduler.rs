//! Per-document lint scheduling
//!
//!     Every document identity owns at most one debounce timer. A new request cancels the
//!     pending timer and replaces it, so a burst of edits coalesces into one lint of the latest
//!     content.
//!
//!     State per document:
//!
//!         Idle ──request──▶ Scheduled ──fire──▶ Linting ──done──▶ Idle
//!                              │
//!                              └──cancel──▶ Idle
//!
//!     Only one pass runs per document. A timer that fires while a pass is running marks the
//!     document dirty, and the running pass loops once more when it finishes. Every request
//!     and cancellation bumps the document's generation; a pass whose generation is no longer
//!     current when it finishes is discarded instead of committed.
//!
//!     Failures never reach the scheduler: [`LintTask::run`] recovers them itself and returns
//!     `None`, which leaves the previous diagnostics in place.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::Url;
use tracing::debug;

#[async_trait]
pub trait LintTask: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Lint the current content of `uri`. `None` means there is nothing to commit.
    async fn run(&self, uri: &Url) -> Option<Self::Output>;

    /// Publish the result of a pass that is still current.
    async fn commit(&self, uri: &Url, output: Self::Output);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintState {
    Idle,
    Scheduled,
    Linting,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    timer: Option<JoinHandle<()>>,
    linting: bool,
    dirty: bool,
}

impl Slot {
    fn state(&self) -> LintState {
        if self.linting {
            LintState::Linting
        } else if self.timer.is_some() {
            LintState::Scheduled
        } else {
            LintState::Idle
        }
    }
}

struct Inner<T> {
    task: Arc<T>,
    slots: Mutex<HashMap<Url, Slot>>,
    generations: AtomicU64,
}

pub struct LintScheduler<T: LintTask> {
    inner: Arc<Inner<T>>,
}

impl<T: LintTask> LintScheduler<T> {
    pub fn new(task: Arc<T>) -> Self {
        Self {
            inner: Arc::new(Inner {
                task,
                slots: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Schedule a lint of `uri` after `delay`, superseding any pending request.
    pub async fn request_lint(&self, uri: Url, delay: Duration) {
        let mut slots = self.inner.slots.lock().await;
        let slot = slots.entry(uri.clone()).or_default();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        let generation = self.inner.next_generation();
        slot.generation = generation;
        debug!(%uri, generation, ?delay, "lint scheduled");

        let inner = Arc::clone(&self.inner);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire(uri, generation).await;
        }));
    }

    /// Drop the pending timer of `uri`, if any, and invalidate a running pass. Idempotent.
    pub async fn cancel_lint(&self, uri: &Url) {
        let mut slots = self.inner.slots.lock().await;
        let Some(slot) = slots.get_mut(uri) else {
            return;
        };
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation = self.inner.next_generation();
        slot.dirty = false;
        debug!(%uri, "lint cancelled");
        if !slot.linting {
            slots.remove(uri);
        }
    }

    /// The content of `uri` changed: a running pass must not commit. A pending timer is kept, it
    /// lints whatever the content is when it fires.
    pub async fn invalidate(&self, uri: &Url) {
        let mut slots = self.inner.slots.lock().await;
        let Some(slot) = slots.get_mut(uri) else {
            return;
        };
        if slot.linting && slot.timer.is_none() {
            slot.generation = self.inner.next_generation();
            debug!(%uri, "running lint invalidated");
        }
    }

    pub async fn state(&self, uri: &Url) -> LintState {
        self.inner
            .slots
            .lock()
            .await
            .get(uri)
            .map_or(LintState::Idle, Slot::state)
    }
}

impl<T: LintTask> Inner<T> {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn fire(self: Arc<Self>, uri: Url, generation: u64) {
        {
            let mut slots = self.slots.lock().await;
            let Some(slot) = slots.get_mut(&uri) else {
                return;
            };
            if slot.generation != generation {
                return;
            }
            slot.timer = None;
            if slot.linting {
                debug!(%uri, "lint already running, marking dirty");
                slot.dirty = true;
                return;
            }
            slot.linting = true;
        }

        let mut generation = generation;
        loop {
            debug!(%uri, generation, "lint started");
            let output = self.task.run(&uri).await;

            let mut slots = self.slots.lock().await;
            let current = slots
                .get(&uri)
                .is_some_and(|slot| slot.generation == generation);
            match output {
                // Committed under the lock so a concurrent cancel cannot interleave.
                Some(output) if current => self.task.commit(&uri, output).await,
                Some(_) => debug!(%uri, generation, "discarding stale lint result"),
                None => {}
            }

            let Some(slot) = slots.get_mut(&uri) else {
                return;
            };
            if slot.dirty {
                slot.dirty = false;
                generation = slot.generation;
                continue;
            }
            slot.linting = false;
            if slot.timer.is_none() {
                slots.remove(&uri);
            }
            debug!(%uri, "lint finished");
            return;
        }
    }
}

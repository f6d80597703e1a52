//! Incremental reveal driver
//!
//! Re-emits a text one character at a time on a fixed timer, so "data
//! arrived" is decoupled from "text visibly appears". Each key runs its own
//! timer task; a newer reveal for the same key supersedes the older one.
//!
//! All state (visible prefixes, generations, timer handles) lives inside a
//! single `watch` channel value, so a write and the teardown check happen
//! under the same lock. A timer that fires after `clear()`/`flush()` or
//! after being superseded finds a mismatched generation or an inactive
//! driver and writes nothing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Target slot of a reveal: a field, optionally inside a multi-item stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevealKey {
    pub item: Option<usize>,
    pub field: String,
}

impl RevealKey {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            item: None,
            field: field.into(),
        }
    }

    pub fn item(index: usize, field: impl Into<String>) -> Self {
        Self {
            item: Some(index),
            field: field.into(),
        }
    }
}

impl std::fmt::Display for RevealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item {
            Some(index) => write!(f, "{}#{}", self.field, index),
            None => write!(f, "{}", self.field),
        }
    }
}

#[derive(Debug, Default)]
struct RevealSlot {
    visible: String,
    target: String,
    generation: u64,
    updates: usize,
    done: bool,
}

/// Snapshot of every reveal slot, as seen by subscribers
#[derive(Debug)]
pub struct RevealView {
    active: bool,
    slots: BTreeMap<RevealKey, RevealSlot>,
    timers: HashMap<RevealKey, AbortHandle>,
}

impl Default for RevealView {
    fn default() -> Self {
        Self {
            active: true,
            slots: BTreeMap::new(),
            timers: HashMap::new(),
        }
    }
}

impl RevealView {
    /// Currently visible prefix for a key
    pub fn text(&self, key: &RevealKey) -> Option<&str> {
        self.slots.get(key).map(|slot| slot.visible.as_str())
    }

    /// Full text the key is revealing towards
    pub fn target(&self, key: &RevealKey) -> Option<&str> {
        self.slots.get(key).map(|slot| slot.target.as_str())
    }

    /// Whether the latest reveal for the key has written its last prefix
    pub fn is_done(&self, key: &RevealKey) -> bool {
        self.slots.get(key).map(|slot| slot.done).unwrap_or(false)
    }

    /// Prefix writes applied by the latest reveal for the key
    pub fn updates(&self, key: &RevealKey) -> usize {
        self.slots.get(key).map(|slot| slot.updates).unwrap_or(0)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug)]
struct RevealInner {
    view: watch::Sender<RevealView>,
    generations: AtomicU64,
}

/// Owned by one stream session; clones share the same timer set
#[derive(Debug, Clone)]
pub struct RevealDriver {
    inner: Arc<RevealInner>,
}

impl Default for RevealDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealDriver {
    pub fn new() -> Self {
        let (view, _) = watch::channel(RevealView::default());
        Self {
            inner: Arc::new(RevealInner {
                view,
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Reveal `text` into `key`, one character per `speed`.
    ///
    /// Prefixes of length 0..=N (in chars) are written at `i * speed`, so a
    /// text of N characters produces exactly N+1 writes. Any running reveal
    /// for the same key is aborted first. Must be called inside a tokio
    /// runtime.
    pub fn reveal(&self, key: RevealKey, text: impl Into<String>, speed: Duration) {
        let text = text.into();
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;

        let mut accepted = false;
        self.inner.view.send_modify(|view| {
            if !view.active {
                return;
            }
            if let Some(stale) = view.timers.remove(&key) {
                stale.abort();
            }
            let slot = view.slots.entry(key.clone()).or_default();
            slot.target = text.clone();
            slot.generation = generation;
            slot.updates = 0;
            slot.done = false;
            accepted = true;
        });
        if !accepted {
            tracing::debug!(key = %key, "Reveal ignored: driver already torn down");
            return;
        }

        let task = tokio::spawn(run_reveal(
            self.inner.clone(),
            key.clone(),
            text,
            generation,
            speed,
        ));

        // The task may already have finished (or been superseded) by the time
        // it is registered; only track it while it is the live generation.
        self.inner.view.send_if_modified(|view| {
            let live = view.active
                && view
                    .slots
                    .get(&key)
                    .map(|slot| slot.generation == generation && !slot.done)
                    .unwrap_or(false);
            if live {
                view.timers.insert(key.clone(), task.abort_handle());
            } else {
                task.abort();
            }
            false
        });
    }

    /// Abort every timer and drop all slots. Further reveals are ignored.
    ///
    /// Returns the number of timers that were still pending.
    pub fn clear(&self) -> usize {
        let mut aborted = 0;
        self.inner.view.send_modify(|view| {
            view.active = false;
            for (_, timer) in view.timers.drain() {
                timer.abort();
                aborted += 1;
            }
            view.slots.clear();
        });
        aborted
    }

    /// Abort every timer and show each slot's full text at once.
    /// Further reveals are ignored.
    pub fn flush(&self) -> usize {
        let mut aborted = 0;
        self.inner.view.send_modify(|view| {
            view.active = false;
            for (_, timer) in view.timers.drain() {
                timer.abort();
                aborted += 1;
            }
            for slot in view.slots.values_mut() {
                if slot.visible != slot.target {
                    slot.visible = slot.target.clone();
                    slot.updates += 1;
                }
                slot.done = true;
            }
        });
        aborted
    }

    /// Number of timers still running
    pub fn pending(&self) -> usize {
        self.inner.view.borrow().timers.len()
    }

    pub fn text(&self, key: &RevealKey) -> Option<String> {
        self.inner.view.borrow().text(key).map(str::to_string)
    }

    pub fn updates(&self, key: &RevealKey) -> usize {
        self.inner.view.borrow().updates(key)
    }

    pub fn subscribe(&self) -> watch::Receiver<RevealView> {
        self.inner.view.subscribe()
    }
}

async fn run_reveal(
    inner: Arc<RevealInner>,
    key: RevealKey,
    text: String,
    generation: u64,
    speed: Duration,
) {
    let ends: Vec<usize> = std::iter::once(0)
        .chain(text.char_indices().map(|(i, c)| i + c.len_utf8()))
        .collect();
    let last = ends.len() - 1;

    for (step, end) in ends.into_iter().enumerate() {
        if step > 0 {
            tokio::time::sleep(speed).await;
        }

        let applied = inner.view.send_if_modified(|view| {
            if !view.active {
                return false;
            }
            match view.slots.get_mut(&key) {
                Some(slot) if slot.generation == generation => {
                    slot.visible = text[..end].to_string();
                    slot.updates += 1;
                    if step == last {
                        slot.done = true;
                        view.timers.remove(&key);
                    }
                    true
                }
                _ => false,
            }
        });

        if !applied {
            return;
        }
    }
}

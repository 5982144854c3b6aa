//! Durable queue of lifecycle callbacks.
//!
//! User handlers for authentication, token and graph-response events must run
//! even when a full-page redirect destroys the execution context mid-flow.
//! Every mutation is written through to the persisted store so a reload can
//! resume delivery. Delivery is at-least-once: an entry is only removed after
//! its handler completes without error.

use crate::bridge::StateStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Storage key for the serialized queue.
pub const QUEUE_KEY: &str = "msal.callbackqueue";

/// Lifecycle events with a configurable user handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Login result after a redirect, success or error.
    Authentication,
    /// Token result after a redirect, success or error.
    Token,
    /// Profile fetch result.
    GraphResponse,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Authentication => "authentication",
            EventKind::Token => "token",
            EventKind::GraphResponse => "graph_response",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one queued callback: event kind plus a monotonic sequence
/// number, unique across reloads of the same store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackId {
    pub kind: EventKind,
    pub seq: u64,
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.seq)
    }
}

/// One queued callback invocation: the event it belongs to plus the opaque
/// arguments captured when it fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: CallbackId,
    pub args: Vec<Value>,
}

/// The queue itself. In-memory entries and the persisted copy are kept
/// consistent after every mutation.
pub struct CallbackQueue {
    store: Arc<dyn StateStore>,
    entries: Mutex<Vec<QueueEntry>>,
    seq: AtomicU64,
}

impl CallbackQueue {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            entries: Mutex::new(Vec::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Merge any persisted queue into memory (persisted entries after
    /// in-memory ones) and advance the sequence counter past them, so entries
    /// enqueued before a redirect are retried after the reload.
    pub fn load(&self) {
        let Some(raw) = self.store.get_item(QUEUE_KEY) else {
            return;
        };

        let saved: Vec<QueueEntry> = match serde_json::from_str(&raw) {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Discarding unreadable persisted callback queue: {e}");
                self.store.remove_item(QUEUE_KEY);
                return;
            }
        };

        let mut entries = self.entries.lock().expect("queue lock poisoned");
        entries.extend(saved);

        let next = entries.iter().map(|e| e.id.seq + 1).max().unwrap_or(0);
        self.seq.fetch_max(next, Ordering::SeqCst);
    }

    /// Append a new entry, persist, and return it for immediate execution.
    pub fn push(&self, kind: EventKind, args: Vec<Value>) -> QueueEntry {
        let entry = QueueEntry {
            id: CallbackId {
                kind,
                seq: self.seq.fetch_add(1, Ordering::SeqCst),
            },
            args,
        };

        let mut entries = self.entries.lock().expect("queue lock poisoned");
        entries.push(entry.clone());
        self.persist(&entries);

        entry
    }

    /// Remove a delivered entry by id and re-persist.
    pub fn remove(&self, id: CallbackId) {
        let mut entries = self.entries.lock().expect("queue lock poisoned");
        entries.retain(|e| e.id != id);
        self.persist(&entries);
    }

    /// Current entries, in insertion order.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.lock().expect("queue lock poisoned").clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("queue lock poisoned").is_empty()
    }

    /// Write the persisted copy; an empty queue removes the key instead.
    fn persist(&self, entries: &[QueueEntry]) {
        if entries.is_empty() {
            self.store.remove_item(QUEUE_KEY);
            return;
        }

        match serde_json::to_string(entries) {
            Ok(json) => self.store.set_item(QUEUE_KEY, &json),
            Err(e) => warn!("Failed to persist callback queue: {e}"),
        }
    }
}

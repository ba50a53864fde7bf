/// Event system for cross-component progress notifications.
///
/// Completion events are emitted by the progress recorder after a write has
/// been acknowledged and consumed by any live playlist view so it can
/// recompute item availability from the completion set of record.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The kind of item a playlist holds. A playlist is homogeneous: all of its
/// items are tests or all of them are courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Test,
    Course,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Test => write!(f, "test"),
            ItemKind::Course => write!(f, "course"),
        }
    }
}

/// Emitted once per recorded completion, after the progress row write was
/// acknowledged by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub playlist_id: i64,
    pub student_id: i64,
    pub item_id: i64,
    pub kind: ItemKind,
    pub completed_at: DateTime<Utc>,
}

impl CompletionEvent {
    pub fn new(playlist_id: i64, student_id: i64, item_id: i64, kind: ItemKind) -> Self {
        CompletionEvent {
            playlist_id,
            student_id,
            item_id,
            kind,
            completed_at: Utc::now(),
        }
    }
}

/// In-process publish/subscribe channel for [`CompletionEvent`]s.
///
/// Backed by a Tokio broadcast channel; cloning the bus clones the handle,
/// not the channel. Publishing with no live subscribers is a no-op.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CompletionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        EventBus { tx }
    }

    /// Subscribes to completion events. Each receiver sees every event
    /// published after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to all current subscribers, returning how many
    /// received it.
    pub fn publish(&self, event: CompletionEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

//! Playback queue state machine.
//!
//! The single source of truth for the ordered playback queue, the current
//! position, the playing flag, and the volume. All mutation goes through
//! [`QueueManager`]; presentation components read cloned snapshots and
//! request changes through the operation set, so the cursor invariants are
//! enforced in exactly one place.
//!
//! The cursor behaves like an index over an array that can shrink and
//! reorder under it: every structural mutation re-validates it. Whenever
//! the queue is empty the cursor is [`NO_SELECTION`]; whenever a selection
//! exists it is within bounds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::item::{ItemStatus, PlaylistItem};
use crate::session::SessionState;

/// Cursor sentinel meaning "no entry selected".
pub const NO_SELECTION: i64 = -1;

/// Default playback volume.
pub const DEFAULT_VOLUME: f64 = 1.0;

/// Event types emitted by the queue manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum QueueEvent {
    /// The queue was replaced wholesale.
    PlaylistReplaced {
        /// Number of entries in the new queue.
        count: usize,
    },
    /// An entry was appended to the queue.
    ItemAdded(PlaylistItem),
    /// An entry was removed from the queue.
    ItemRemoved {
        /// The removed entry's id.
        id: String,
    },
    /// The queue order was replaced.
    QueueReordered,
    /// The queue was cleared.
    QueueCleared,
    /// The cursor moved.
    PositionChanged {
        /// New cursor value (may be [`NO_SELECTION`]).
        index: i64,
    },
    /// An entry's status changed.
    StatusChanged {
        /// The entry's id.
        id: String,
        /// The new status.
        status: ItemStatus,
    },
    /// Playback was started.
    PlaybackStarted,
    /// Playback was paused.
    PlaybackPaused,
    /// The volume changed.
    VolumeChanged {
        /// New volume in `0.0..=1.0`.
        volume: f64,
    },
}

/// Internal state for the queue manager.
struct PlayerState {
    /// Ordered playback queue; array position is playback order.
    queue: Vec<PlaylistItem>,
    /// Cursor into `queue`, or [`NO_SELECTION`].
    current_index: i64,
    /// Whether playback is active. Never persisted.
    playing: bool,
    /// Playback volume in `0.0..=1.0`.
    volume: f64,
}

impl PlayerState {
    const fn new() -> Self {
        Self {
            queue: Vec::new(),
            current_index: NO_SELECTION,
            playing: false,
            volume: DEFAULT_VOLUME,
        }
    }

    /// Re-validate the cursor after the queue shrank.
    fn clamp_cursor(&mut self) {
        let len = self.queue.len() as i64;
        if len == 0 {
            self.current_index = NO_SELECTION;
        } else if self.current_index >= len {
            self.current_index = len - 1;
        }
    }

    fn find_item_mut(&mut self, id: &str) -> Option<&mut PlaylistItem> {
        self.queue.iter_mut().find(|item| item.id == id)
    }
}

/// Manages the playback queue and its cursor.
///
/// Cloneable handles share the same state; mutation is serialized through
/// the internal write lock.
pub struct QueueManager {
    /// Internal state protected by async `RwLock`.
    state: Arc<RwLock<PlayerState>>,
    /// Channel for sending queue events.
    event_tx: mpsc::UnboundedSender<QueueEvent>,
    /// Channel for receiving queue events.
    event_rx: Arc<RwLock<mpsc::UnboundedReceiver<QueueEvent>>>,
}

impl QueueManager {
    /// Create a new, empty queue manager.
    #[must_use]
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(RwLock::new(PlayerState::new())),
            event_tx,
            event_rx: Arc::new(RwLock::new(event_rx)),
        }
    }

    /// Replace the queue wholesale.
    ///
    /// The cursor moves to the first entry when `items` is non-empty,
    /// otherwise to [`NO_SELECTION`]. Playback stops either way.
    pub async fn set_playlist(&self, items: Vec<PlaylistItem>) {
        let mut state = self.state.write().await;
        info!("Replacing queue with {} entries", items.len());

        state.queue = items;
        state.current_index = if state.queue.is_empty() {
            NO_SELECTION
        } else {
            0
        };
        state.playing = false;

        let _ = self.event_tx.send(QueueEvent::PlaylistReplaced {
            count: state.queue.len(),
        });
        let _ = self.event_tx.send(QueueEvent::PositionChanged {
            index: state.current_index,
        });
    }

    /// Append an entry to the end of the queue.
    ///
    /// Duplicate ids are not rejected; keeping ids unique is the caller's
    /// responsibility. Appending to an empty queue selects the new entry.
    pub async fn add_to_queue(&self, item: PlaylistItem) {
        let mut state = self.state.write().await;
        debug!("Queueing entry: id={}, title={}", item.id, item.title);

        if state.current_index == NO_SELECTION && state.queue.is_empty() {
            state.current_index = 0;
        }
        let _ = self.event_tx.send(QueueEvent::ItemAdded(item.clone()));
        state.queue.push(item);
    }

    /// Remove the first entry matching `id`.
    ///
    /// The cursor is clamped into the new bounds (and to [`NO_SELECTION`]
    /// when the queue empties); it is not remapped to follow any entry.
    /// Returns true if an entry was removed.
    pub async fn remove_from_queue(&self, id: &str) -> bool {
        let mut state = self.state.write().await;

        let Some(pos) = state.queue.iter().position(|item| item.id == id) else {
            warn!("Cannot remove entry {} - not found", id);
            return false;
        };

        state.queue.remove(pos);
        let previous = state.current_index;
        state.clamp_cursor();

        let _ = self.event_tx.send(QueueEvent::ItemRemoved {
            id: id.to_string(),
        });
        if state.current_index != previous {
            let _ = self.event_tx.send(QueueEvent::PositionChanged {
                index: state.current_index,
            });
        }
        info!("Removed entry {} from queue", id);
        true
    }

    /// Replace the queue order with `new_order`.
    ///
    /// `new_order` should be a permutation of the current queue; a
    /// mismatched id set is accepted with a warning (caller's
    /// responsibility, as with duplicate adds).
    ///
    /// The cursor stays a raw index and is NOT remapped to follow the
    /// entry it pointed at, so the selected row can change identity across
    /// a manual reorder. Whether it should follow the entry by id instead
    /// is an open product decision; see DESIGN.md.
    pub async fn reorder_queue(&self, new_order: Vec<PlaylistItem>) {
        let mut state = self.state.write().await;

        let mut before: Vec<&str> = state.queue.iter().map(|i| i.id.as_str()).collect();
        let mut after: Vec<&str> = new_order.iter().map(|i| i.id.as_str()).collect();
        before.sort_unstable();
        after.sort_unstable();
        if before != after {
            warn!(
                "Reorder is not a permutation of the current queue ({} -> {} entries)",
                before.len(),
                after.len()
            );
        }
        drop(before);
        drop(after);

        state.queue = new_order;
        state.clamp_cursor();
        let _ = self.event_tx.send(QueueEvent::QueueReordered);
    }

    /// Empty the queue, clear the selection, and stop playback.
    pub async fn clear_queue(&self) {
        let mut state = self.state.write().await;
        info!("Clearing queue ({} entries)", state.queue.len());

        state.queue.clear();
        state.current_index = NO_SELECTION;
        state.playing = false;

        let _ = self.event_tx.send(QueueEvent::QueueCleared);
        let _ = self.event_tx.send(QueueEvent::PositionChanged {
            index: NO_SELECTION,
        });
    }

    /// Select the entry at `index` and start playback.
    ///
    /// Out-of-bounds indices are a no-op. Returns true if the cursor moved.
    pub async fn jump_to(&self, index: usize) -> bool {
        let mut state = self.state.write().await;
        if index >= state.queue.len() {
            debug!("jump_to({}) out of bounds, ignoring", index);
            return false;
        }

        state.current_index = index as i64;
        state.playing = true;
        let _ = self.event_tx.send(QueueEvent::PositionChanged {
            index: state.current_index,
        });
        let _ = self.event_tx.send(QueueEvent::PlaybackStarted);
        true
    }

    /// Advance to the next entry, or stop playback at the end of the queue.
    pub async fn next(&self) {
        let mut state = self.state.write().await;
        if state.current_index + 1 < state.queue.len() as i64 {
            state.current_index += 1;
            state.playing = true;
            let _ = self.event_tx.send(QueueEvent::PositionChanged {
                index: state.current_index,
            });
            let _ = self.event_tx.send(QueueEvent::PlaybackStarted);
        } else {
            debug!("next() at end of queue, stopping playback");
            state.playing = false;
            let _ = self.event_tx.send(QueueEvent::PlaybackPaused);
        }
    }

    /// Move back one entry. No-op at the start of the queue.
    pub async fn prev(&self) {
        let mut state = self.state.write().await;
        if state.current_index > 0 {
            state.current_index -= 1;
            state.playing = true;
            let _ = self.event_tx.send(QueueEvent::PositionChanged {
                index: state.current_index,
            });
            let _ = self.event_tx.send(QueueEvent::PlaybackStarted);
        }
    }

    /// Update the status of the entry matching `id`.
    ///
    /// Returns true if an entry was updated.
    pub async fn update_status(&self, id: &str, status: ItemStatus) -> bool {
        let mut state = self.state.write().await;

        if let Some(item) = state.find_item_mut(id) {
            item.status = status;
            let _ = self.event_tx.send(QueueEvent::StatusChanged {
                id: id.to_string(),
                status,
            });
            true
        } else {
            warn!("Cannot update status of entry {} - not found", id);
            false
        }
    }

    /// Set the playing flag. Independent of queue mutation.
    pub async fn play(&self) {
        let mut state = self.state.write().await;
        if !state.playing {
            state.playing = true;
            let _ = self.event_tx.send(QueueEvent::PlaybackStarted);
        }
    }

    /// Clear the playing flag. Independent of queue mutation.
    pub async fn pause(&self) {
        let mut state = self.state.write().await;
        if state.playing {
            state.playing = false;
            let _ = self.event_tx.send(QueueEvent::PlaybackPaused);
        }
    }

    /// Set the playback volume, clamped to `0.0..=1.0`.
    pub async fn set_volume(&self, volume: f64) {
        let mut state = self.state.write().await;
        state.volume = volume.clamp(0.0, 1.0);
        let _ = self.event_tx.send(QueueEvent::VolumeChanged {
            volume: state.volume,
        });
    }

    /// Get a cloned snapshot of the queue.
    pub async fn playlist(&self) -> Vec<PlaylistItem> {
        let state = self.state.read().await;
        state.queue.clone()
    }

    /// Get the current cursor value.
    pub async fn current_index(&self) -> i64 {
        let state = self.state.read().await;
        state.current_index
    }

    /// Get the currently selected entry, if any.
    pub async fn current_item(&self) -> Option<PlaylistItem> {
        let state = self.state.read().await;
        usize::try_from(state.current_index)
            .ok()
            .and_then(|i| state.queue.get(i).cloned())
    }

    /// Get a specific entry by id.
    pub async fn item(&self, id: &str) -> Option<PlaylistItem> {
        let state = self.state.read().await;
        state.queue.iter().find(|item| item.id == id).cloned()
    }

    /// Whether playback is active.
    pub async fn is_playing(&self) -> bool {
        let state = self.state.read().await;
        state.playing
    }

    /// Current playback volume.
    pub async fn volume(&self) -> f64 {
        let state = self.state.read().await;
        state.volume
    }

    /// Number of entries in the queue.
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        state.queue.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        let state = self.state.read().await;
        state.queue.is_empty()
    }

    /// Capture the durable subset of the state for persistence.
    ///
    /// The playing flag and any media handles are deliberately excluded:
    /// playback must never auto-resume on reload, and file handles cannot
    /// outlive the session.
    pub async fn snapshot(&self) -> SessionState {
        let state = self.state.read().await;
        SessionState {
            playlist: state.queue.clone(),
            current_index: state.current_index,
            volume: state.volume,
        }
    }

    /// Restore a previously persisted session.
    ///
    /// The cursor is clamped into the restored queue's bounds; playback
    /// always resumes paused.
    pub async fn restore(&self, session: SessionState) {
        let mut state = self.state.write().await;
        info!(
            "Restoring session: {} entries, cursor {}",
            session.playlist.len(),
            session.current_index
        );

        state.queue = session.playlist;
        state.current_index = session.current_index.max(NO_SELECTION);
        state.clamp_cursor();
        state.volume = session.volume.clamp(0.0, 1.0);
        state.playing = false;

        let _ = self.event_tx.send(QueueEvent::PlaylistReplaced {
            count: state.queue.len(),
        });
        let _ = self.event_tx.send(QueueEvent::PositionChanged {
            index: state.current_index,
        });
    }

    /// Try to receive a queue event without blocking.
    pub async fn try_recv_event(&self) -> Option<QueueEvent> {
        let mut rx = self.event_rx.write().await;
        rx.try_recv().ok()
    }

    /// Get a clone of the event sender for external use.
    #[must_use]
    pub fn event_sender(&self) -> mpsc::UnboundedSender<QueueEvent> {
        self.event_tx.clone()
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for QueueManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            event_tx: self.event_tx.clone(),
            event_rx: Arc::clone(&self.event_rx),
        }
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::item::SourceType;

    fn local(id: &str) -> PlaylistItem {
        let mut item = PlaylistItem::new(SourceType::Local)
            .with_title(id)
            .with_file_name(format!("{id}.mp4"));
        item.id = id.to_string();
        item
    }

    #[tokio::test]
    async fn test_set_playlist_selects_first() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;

        assert_eq!(queue.current_index().await, 0);
        assert!(!queue.is_playing().await);
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn test_set_empty_playlist_clears_selection() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a")]).await;
        queue.set_playlist(vec![]).await;

        assert_eq!(queue.current_index().await, NO_SELECTION);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_to_empty_queue_selects_it() {
        let queue = QueueManager::new();
        queue.add_to_queue(local("a")).await;

        assert_eq!(queue.current_index().await, 0);
        assert_eq!(queue.current_item().await.unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_add_to_nonempty_queue_keeps_cursor() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a")]).await;
        queue.jump_to(0).await;
        queue.add_to_queue(local("b")).await;

        assert_eq!(queue.current_index().await, 0);
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_before_cursor_clamps_raw_index() {
        let queue = QueueManager::new();
        queue
            .set_playlist(vec![local("a"), local("b"), local("c")])
            .await;
        queue.jump_to(2).await;

        // Removing an entry before the cursor does not remap it; the raw
        // index just gets clamped into the new bounds.
        assert!(queue.remove_from_queue("a").await);
        assert_eq!(queue.current_index().await, 1);
        assert_eq!(queue.current_item().await.unwrap().id, "c");
    }

    #[tokio::test]
    async fn test_remove_within_bounds_keeps_cursor() {
        let queue = QueueManager::new();
        queue
            .set_playlist(vec![local("a"), local("b"), local("c")])
            .await;
        queue.jump_to(0).await;

        assert!(queue.remove_from_queue("c").await);
        assert_eq!(queue.current_index().await, 0);
    }

    #[tokio::test]
    async fn test_remove_last_remaining_clears_selection() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a")]).await;

        assert!(queue.remove_from_queue("a").await);
        assert_eq!(queue.current_index().await, NO_SELECTION);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a")]).await;

        assert!(!queue.remove_from_queue("zzz").await);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_reorder_does_not_remap_cursor() {
        let queue = QueueManager::new();
        queue
            .set_playlist(vec![local("a"), local("b"), local("c")])
            .await;
        queue.jump_to(1).await;
        assert_eq!(queue.current_item().await.unwrap().id, "b");

        queue
            .reorder_queue(vec![local("b"), local("c"), local("a")])
            .await;

        // Cursor stays at raw index 1, which is now a different entry.
        assert_eq!(queue.current_index().await, 1);
        assert_eq!(queue.current_item().await.unwrap().id, "c");
    }

    #[tokio::test]
    async fn test_clear_queue_resets_everything() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;
        queue.jump_to(1).await;
        queue.clear_queue().await;

        assert!(queue.is_empty().await);
        assert_eq!(queue.current_index().await, NO_SELECTION);
        assert!(!queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_jump_to_out_of_bounds_is_noop() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![]).await;

        assert!(!queue.jump_to(0).await);
        assert_eq!(queue.current_index().await, NO_SELECTION);
        assert!(!queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_jump_to_starts_playback() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;

        assert!(queue.jump_to(1).await);
        assert_eq!(queue.current_index().await, 1);
        assert!(queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_next_advances_and_plays() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;

        queue.next().await;
        assert_eq!(queue.current_index().await, 1);
        assert!(queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_next_at_end_stops_without_advancing() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;
        queue.jump_to(1).await;

        queue.next().await;
        assert_eq!(queue.current_index().await, 1);
        assert!(!queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_prev_at_start_is_noop() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;

        queue.prev().await;
        assert_eq!(queue.current_index().await, 0);
        assert!(!queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_prev_moves_back_and_plays() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;
        queue.jump_to(1).await;
        queue.pause().await;

        queue.prev().await;
        assert_eq!(queue.current_index().await, 0);
        assert!(queue.is_playing().await);
    }

    #[tokio::test]
    async fn test_update_status() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a"), local("b")]).await;

        assert!(queue.update_status("b", ItemStatus::Playing).await);
        assert_eq!(queue.item("b").await.unwrap().status, ItemStatus::Playing);
        assert_eq!(queue.item("a").await.unwrap().status, ItemStatus::Ready);

        assert!(!queue.update_status("zzz", ItemStatus::Done).await);
    }

    #[tokio::test]
    async fn test_play_pause_flag_only() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a")]).await;

        queue.play().await;
        assert!(queue.is_playing().await);
        queue.pause().await;
        assert!(!queue.is_playing().await);
        // Flag toggles never move the cursor.
        assert_eq!(queue.current_index().await, 0);
    }

    #[tokio::test]
    async fn test_set_volume_clamps() {
        let queue = QueueManager::new();

        queue.set_volume(1.5).await;
        assert_eq!(queue.volume().await, 1.0);
        queue.set_volume(-0.3).await;
        assert_eq!(queue.volume().await, 0.0);
        queue.set_volume(0.42).await;
        assert_eq!(queue.volume().await, 0.42);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let queue = QueueManager::new();
        queue
            .set_playlist(vec![local("a"), local("b"), local("c")])
            .await;
        queue.jump_to(2).await;
        queue.set_volume(0.5).await;
        assert!(queue.is_playing().await);

        let snapshot = queue.snapshot().await;

        let restored = QueueManager::new();
        restored.restore(snapshot).await;

        assert_eq!(restored.playlist().await, queue.playlist().await);
        assert_eq!(restored.current_index().await, 2);
        assert_eq!(restored.volume().await, 0.5);
        // Playback never auto-resumes from a restored session.
        assert!(!restored.is_playing().await);
    }

    #[tokio::test]
    async fn test_restore_clamps_stale_cursor() {
        let queue = QueueManager::new();
        queue.restore(SessionState {
            playlist: vec![local("a")],
            current_index: 7,
            volume: DEFAULT_VOLUME,
        })
        .await;

        assert_eq!(queue.current_index().await, 0);
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let queue = QueueManager::new();
        queue.set_playlist(vec![local("a")]).await;

        let event = queue.try_recv_event().await;
        assert!(matches!(
            event,
            Some(QueueEvent::PlaylistReplaced { count: 1 })
        ));
    }
}

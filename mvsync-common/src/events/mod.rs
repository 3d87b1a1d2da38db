//! Notification types and EventBus for the synchronizer
//!
//! Every observable step of a synchronization session is published as a
//! [`SyncEvent`] on an [`EventBus`]. External control arrives the other way
//! as a [`SyncCommand`].

mod command_types;

pub use command_types::SyncCommand;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Synchronizer notifications
///
/// Serialized with a kebab-case `type` tag, so `SyncEvent::MasterSet` becomes
/// `{"type":"master-set","id":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SyncEvent {
    /// An identifier passed validation and was added to the registry
    RegisteringId {
        id: String,
    },

    /// An identifier does not resolve to a media element (or is a duplicate)
    InvalidId {
        id: String,
    },

    /// Setup aborted: fewer than two usable players
    NotEnoughVideos,

    /// A player finished loading its media data
    PlayerLoaded {
        id: String,
    },

    /// Master player designated
    MasterSet {
        id: String,
    },

    /// Every registered player is ready and initialized; synchronization is active
    AllPlayersReady,

    /// Master started playing
    MasterPlay {
        /// Master position in seconds (None if unavailable)
        time: Option<f64>,
    },

    /// Master paused
    MasterPause {
        time: Option<f64>,
    },

    /// Master reached the end of its media
    MasterEnded {
        /// Master duration in seconds (None if unknown)
        duration: Option<f64>,
    },

    /// Master position advanced
    MasterTimeupdate {
        time: Option<f64>,
    },

    /// A follower drifted out of the tolerance window and is being re-seeked
    Synchronizing {
        /// Master position the follower is moved to
        time: f64,
        /// Follower identifier
        target_id: String,
    },

    /// At least one player lacks enough buffered data ahead of its position
    Buffering,

    /// Buffering cleared and the master was resumed
    ResumedAfterBuffering,

    /// Buffering cleared but the master was paused meanwhile; not resuming
    BufferedButNotAutoplaying,
}

impl SyncEvent {
    /// Returns the notification name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::RegisteringId { .. } => "registering-id",
            SyncEvent::InvalidId { .. } => "invalid-id",
            SyncEvent::NotEnoughVideos => "not-enough-videos",
            SyncEvent::PlayerLoaded { .. } => "player-loaded",
            SyncEvent::MasterSet { .. } => "master-set",
            SyncEvent::AllPlayersReady => "all-players-ready",
            SyncEvent::MasterPlay { .. } => "master-play",
            SyncEvent::MasterPause { .. } => "master-pause",
            SyncEvent::MasterEnded { .. } => "master-ended",
            SyncEvent::MasterTimeupdate { .. } => "master-timeupdate",
            SyncEvent::Synchronizing { .. } => "synchronizing",
            SyncEvent::Buffering => "buffering",
            SyncEvent::ResumedAfterBuffering => "resumed-after-buffering",
            SyncEvent::BufferedButNotAutoplaying => "buffered-but-not-autoplaying",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Broadcast channel for synchronizer notifications
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the synchronizer)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mvsync_common::events::{EventBus, SyncEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(SyncEvent::AllPlayersReady).ok();
///
/// let received = rx.try_recv().unwrap();
/// assert_eq!(received.event_type(), "all-players-ready");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SyncEvent,
    ) -> Result<usize, broadcast::error::SendError<SyncEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

//! External control signals
//!
//! Commands are fire-and-respond: the synchronizer acts on them only once
//! every registered player is initialized, otherwise they are dropped.

use serde::{Deserialize, Serialize};

/// Control signals pushed into a synchronization session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SyncCommand {
    /// Play the master (followers follow)
    Play,
    /// Pause the master (followers follow)
    Pause,
    /// Seek the master to a position in seconds
    SeekTo { time: f64 },
    /// Run a synchronization pass now
    Synchronize,
    /// Start the periodic buffer checker (no-op if running)
    StartBufferChecker,
    /// Stop the periodic buffer checker
    StopBufferChecker,
}

impl std::fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommand::Play => write!(f, "play"),
            SyncCommand::Pause => write!(f, "pause"),
            SyncCommand::SeekTo { time } => write!(f, "seek-to({})", time),
            SyncCommand::Synchronize => write!(f, "synchronize"),
            SyncCommand::StartBufferChecker => write!(f, "start-buffer-checker"),
            SyncCommand::StopBufferChecker => write!(f, "stop-buffer-checker"),
        }
    }
}

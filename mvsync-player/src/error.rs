//! Error types for mvsync-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Registration failures
///
/// Each failure is also announced on the event bus before it is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    /// One or more identifiers do not resolve to a media element
    #[error("Invalid player identifier(s): {}", .0.join(", "))]
    InvalidIds(Vec<String>),

    /// Fewer than two usable players
    #[error("Not enough players to synchronize: {found} found, at least 2 required")]
    NotEnoughPlayers { found: usize },
}

/// Main error type for mvsync-player
#[derive(Error, Debug)]
pub enum Error {
    /// Registration failed
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Buffered range with end before start
    #[error("Invalid time range: [{start}, {end}]")]
    InvalidTimeRange { start: f64, end: f64 },

    /// Session task has stopped accepting input
    #[error("Synchronization session closed")]
    SessionClosed,

    /// Configuration or other shared errors
    #[error(transparent)]
    Common(#[from] mvsync_common::Error),
}

/// Convenience Result type using mvsync-player Error
pub type Result<T> = std::result::Result<T, Error>;

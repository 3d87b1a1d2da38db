//! # MVSYNC Player Library (mvsync-player)
//!
//! Keeps several independent media players aligned to a master player's
//! timeline.
//!
//! **Purpose:** Register a group of players, wait until every one of them is
//! ready, then mirror the master's play/pause/seek state onto the followers,
//! correct drift with periodic synchronization passes and hold playback back
//! while any player lacks buffered data.
//!
//! **Architecture:** A single-threaded [`sync::Synchronizer`] state machine
//! fed by player events and commands, driven by one tokio task
//! ([`sync::session`]). Players are reached through the [`player::MediaPlayer`]
//! capability trait, implemented by a native-element adapter and a
//! wrapped-player adapter.

pub mod error;
pub mod player;
pub mod sim;
pub mod sync;

pub use error::{Error, Result, SetupError};
pub use sync::Synchronizer;

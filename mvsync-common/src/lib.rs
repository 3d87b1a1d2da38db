//! # MVSYNC Common Library
//!
//! Shared code for the multi-video synchronizer crates:
//! - Notification and command types (SyncEvent, SyncCommand)
//! - EventBus for broadcasting notifications
//! - Configuration loading
//! - Time helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use config::SyncConfig;
pub use error::{Error, Result};

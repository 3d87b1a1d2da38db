//! Player abstraction
//!
//! Two playback backends are supported behind one contract: a native media
//! element (property-style access) and a wrapping media-library player
//! (method-style access). The backend is picked once per environment and
//! every player is then reached through [`MediaPlayer`].

pub mod environment;
pub mod native;
pub mod time_ranges;
pub mod wrapped;

pub use environment::MediaEnvironment;
pub use native::{NativeElementAdapter, NativeMediaElement};
pub use time_ranges::TimeRanges;
pub use wrapped::{WrappedPlayer, WrappedPlayerAdapter};

use serde::{Deserialize, Serialize};

/// Events a player reports to the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerEvent {
    Play,
    Pause,
    Ended,
    TimeUpdate,
    /// Player object constructed/attached
    Ready,
    /// Media data loaded
    LoadedData,
}

impl std::fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerEvent::Play => write!(f, "play"),
            PlayerEvent::Pause => write!(f, "pause"),
            PlayerEvent::Ended => write!(f, "ended"),
            PlayerEvent::TimeUpdate => write!(f, "timeupdate"),
            PlayerEvent::Ready => write!(f, "ready"),
            PlayerEvent::LoadedData => write!(f, "loadeddata"),
        }
    }
}

/// Playback backend present in an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Bare media elements; `ready` implies data is loaded
    Native,
    /// Media-library player objects; `ready` and `loadeddata` arrive separately
    Wrapped,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Native => write!(f, "native"),
            Backend::Wrapped => write!(f, "wrapped"),
        }
    }
}

/// Uniform capability set over both backends
///
/// Positions and durations are in seconds. `None` means the backend cannot
/// report the value (yet).
pub trait MediaPlayer: Send {
    /// Stable identifier the player was registered under
    fn id(&self) -> &str;

    fn play(&mut self);

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn duration(&self) -> Option<f64>;

    fn current_time(&self) -> Option<f64>;

    /// Set the playback position without any range checks
    fn set_current_time(&mut self, time: f64);

    /// Buffered ranges, or `None` if the backend exposes no buffer information
    fn buffered(&self) -> Option<TimeRanges>;

    fn set_muted(&mut self, muted: bool);

    /// Seek with clamping to the media duration
    ///
    /// Returns `true` only when the requested position was applied. A target
    /// past the end (or infinite) moves the player to its duration and
    /// returns `false`. Negative or NaN targets, and players with unknown
    /// duration, are left untouched.
    fn seek_clamped(&mut self, target: f64) -> bool {
        let Some(duration) = self.duration() else {
            return false;
        };

        if target.is_nan() || target < 0.0 {
            return false;
        }

        if target <= duration {
            self.set_current_time(target);
            true
        } else {
            self.set_current_time(duration);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        time: Option<f64>,
        duration: Option<f64>,
    }

    impl MediaPlayer for Fixed {
        fn id(&self) -> &str {
            "fixed"
        }
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn is_paused(&self) -> bool {
            true
        }
        fn duration(&self) -> Option<f64> {
            self.duration
        }
        fn current_time(&self) -> Option<f64> {
            self.time
        }
        fn set_current_time(&mut self, time: f64) {
            self.time = Some(time);
        }
        fn buffered(&self) -> Option<TimeRanges> {
            None
        }
        fn set_muted(&mut self, _muted: bool) {}
    }

    #[test]
    fn test_seek_within_duration() {
        let mut p = Fixed { time: Some(0.0), duration: Some(60.0) };
        assert!(p.seek_clamped(30.0));
        assert_eq!(p.current_time(), Some(30.0));

        assert!(p.seek_clamped(60.0));
        assert_eq!(p.current_time(), Some(60.0));
    }

    #[test]
    fn test_seek_past_end_clamps_and_fails() {
        let mut p = Fixed { time: Some(5.0), duration: Some(60.0) };
        assert!(!p.seek_clamped(75.0));
        assert_eq!(p.current_time(), Some(60.0));

        assert!(!p.seek_clamped(f64::INFINITY));
        assert_eq!(p.current_time(), Some(60.0));
    }

    #[test]
    fn test_seek_invalid_target_untouched() {
        let mut p = Fixed { time: Some(5.0), duration: Some(60.0) };
        assert!(!p.seek_clamped(-1.0));
        assert!(!p.seek_clamped(f64::NAN));
        assert_eq!(p.current_time(), Some(5.0));
    }

    #[test]
    fn test_seek_unknown_duration() {
        let mut p = Fixed { time: Some(5.0), duration: None };
        assert!(!p.seek_clamped(10.0));
        assert_eq!(p.current_time(), Some(5.0));
    }

    #[test]
    fn test_player_event_serde_names() {
        assert_eq!(serde_json::to_string(&PlayerEvent::LoadedData).unwrap(), "\"loaded-data\"");
        assert_eq!(PlayerEvent::TimeUpdate.to_string(), "timeupdate");
    }
}

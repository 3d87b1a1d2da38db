//! Wrapped media-library player backend
//!
//! Library players expose getters/setters as methods and have no mute flag;
//! muting is done by dropping the volume to zero. The library renders its
//! own inner element whose id carries [`INNER_ELEMENT_SUFFIX`].

use super::{MediaPlayer, TimeRanges};

/// Suffix the media library appends to the id of its inner video element
pub const INNER_ELEMENT_SUFFIX: &str = "_html5_api";

/// Map an inner element id back to the player id it belongs to
pub fn player_id_from_element_id(element_id: &str) -> &str {
    element_id
        .strip_suffix(INNER_ELEMENT_SUFFIX)
        .unwrap_or(element_id)
}

/// Method-style library player
pub trait WrappedPlayer: Send {
    fn player_id(&self) -> &str;

    fn play(&mut self);

    fn pause(&mut self);

    fn paused(&self) -> bool;

    fn duration(&self) -> Option<f64>;

    fn current_time(&self) -> Option<f64>;

    fn seek(&mut self, time: f64);

    fn buffered(&self) -> Option<TimeRanges>;

    fn volume(&self) -> f64;

    fn set_volume(&mut self, volume: f64);
}

/// [`MediaPlayer`] over a [`WrappedPlayer`]
pub struct WrappedPlayerAdapter<P> {
    player: P,
    /// Volume to restore on unmute
    saved_volume: Option<f64>,
}

impl<P: WrappedPlayer> WrappedPlayerAdapter<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            saved_volume: None,
        }
    }

    pub fn inner(&self) -> &P {
        &self.player
    }
}

impl<P: WrappedPlayer> MediaPlayer for WrappedPlayerAdapter<P> {
    fn id(&self) -> &str {
        self.player.player_id()
    }

    fn play(&mut self) {
        self.player.play();
    }

    fn pause(&mut self) {
        self.player.pause();
    }

    fn is_paused(&self) -> bool {
        self.player.paused()
    }

    fn duration(&self) -> Option<f64> {
        self.player.duration().filter(|d| d.is_finite() && *d >= 0.0)
    }

    fn current_time(&self) -> Option<f64> {
        self.player.current_time().filter(|t| t.is_finite() && *t >= 0.0)
    }

    fn set_current_time(&mut self, time: f64) {
        self.player.seek(time);
    }

    fn buffered(&self) -> Option<TimeRanges> {
        self.player.buffered()
    }

    fn set_muted(&mut self, muted: bool) {
        if muted {
            if self.saved_volume.is_none() {
                self.saved_volume = Some(self.player.volume());
            }
            self.player.set_volume(0.0);
        } else if let Some(volume) = self.saved_volume.take() {
            self.player.set_volume(volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LibPlayer {
        volume: f64,
    }

    impl WrappedPlayer for LibPlayer {
        fn player_id(&self) -> &str {
            "slides"
        }
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn paused(&self) -> bool {
            true
        }
        fn duration(&self) -> Option<f64> {
            Some(f64::NAN)
        }
        fn current_time(&self) -> Option<f64> {
            Some(3.0)
        }
        fn seek(&mut self, _time: f64) {}
        fn buffered(&self) -> Option<TimeRanges> {
            None
        }
        fn volume(&self) -> f64 {
            self.volume
        }
        fn set_volume(&mut self, volume: f64) {
            self.volume = volume;
        }
    }

    #[test]
    fn test_strip_inner_suffix() {
        assert_eq!(player_id_from_element_id("cam_html5_api"), "cam");
        assert_eq!(player_id_from_element_id("cam"), "cam");
    }

    #[test]
    fn test_mute_is_zero_volume_and_restores() {
        let mut adapter = WrappedPlayerAdapter::new(LibPlayer { volume: 0.8 });

        adapter.set_muted(true);
        assert_eq!(adapter.inner().volume, 0.0);

        // Muting twice must not lose the original volume
        adapter.set_muted(true);
        adapter.set_muted(false);
        assert_eq!(adapter.inner().volume, 0.8);
    }

    #[test]
    fn test_nan_duration_is_unknown() {
        let adapter = WrappedPlayerAdapter::new(LibPlayer { volume: 1.0 });
        assert_eq!(adapter.duration(), None);
        assert_eq!(adapter.current_time(), Some(3.0));
    }
}

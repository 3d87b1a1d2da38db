//! Native media element backend
//!
//! A native element exposes playback state as properties: times are plain
//! floats (NaN while unknown) and muting is a boolean flag.

use super::{MediaPlayer, TimeRanges};
use mvsync_common::time::known_position;

/// Property-style media element
pub trait NativeMediaElement: Send {
    fn element_id(&self) -> &str;

    fn play(&mut self);

    fn pause(&mut self);

    fn paused(&self) -> bool;

    /// Duration in seconds, NaN while unknown
    fn duration(&self) -> f64;

    /// Position in seconds, NaN while unavailable
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, time: f64);

    fn buffered(&self) -> Option<TimeRanges>;

    fn set_muted(&mut self, muted: bool);
}

/// [`MediaPlayer`] over a [`NativeMediaElement`]
pub struct NativeElementAdapter<E> {
    element: E,
}

impl<E: NativeMediaElement> NativeElementAdapter<E> {
    pub fn new(element: E) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &E {
        &self.element
    }
}

impl<E: NativeMediaElement> MediaPlayer for NativeElementAdapter<E> {
    fn id(&self) -> &str {
        self.element.element_id()
    }

    fn play(&mut self) {
        self.element.play();
    }

    fn pause(&mut self) {
        self.element.pause();
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn duration(&self) -> Option<f64> {
        known_position(self.element.duration())
    }

    fn current_time(&self) -> Option<f64> {
        known_position(self.element.current_time())
    }

    fn set_current_time(&mut self, time: f64) {
        self.element.set_current_time(time);
    }

    fn buffered(&self) -> Option<TimeRanges> {
        self.element.buffered()
    }

    fn set_muted(&mut self, muted: bool) {
        self.element.set_muted(muted);
    }
}

//! Simulated players
//!
//! In-process players with a playback clock, a download model for buffered
//! ranges and browser-like event emission. They back the `mvsync-sim`
//! binary and the tests, and serve either backend shape.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::trace;

use crate::player::wrapped::INNER_ELEMENT_SUFFIX;
use crate::player::{
    Backend, MediaEnvironment, MediaPlayer, NativeElementAdapter, NativeMediaElement, PlayerEvent,
    TimeRanges, WrappedPlayer, WrappedPlayerAdapter,
};
use crate::sync::EventSink;

#[derive(Debug)]
struct SimState {
    id: String,
    position: f64,
    duration: f64,
    paused: bool,
    muted: bool,
    volume: f64,
    /// Playback speed relative to wall time
    rate: f64,
    /// Media seconds downloaded per wall second; 0 keeps `buffered` static
    download_rate: f64,
    buffered: Option<TimeRanges>,
    sink: Option<EventSink>,
}

impl SimState {
    fn emit(&self, event: PlayerEvent) {
        if let Some(sink) = &self.sink {
            // A closed session just stops listening
            let _ = sink.player_event(&self.id, event);
        }
    }

    /// End of the buffered range holding the current position
    fn buffered_edge(&self) -> Option<f64> {
        self.buffered.as_ref().map(|ranges| {
            ranges
                .iter()
                .find(|&(start, end)| start <= self.position && self.position <= end)
                .map_or(self.position, |(_, end)| end)
        })
    }
}

/// Shared handle to one simulated player
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    id: Arc<str>,
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedPlayer {
    /// Paused player at 0s, fully buffered, nothing attached
    pub fn new(id: &str, duration: f64) -> Self {
        let buffered = TimeRanges::from_ranges([(0.0, duration.max(0.0))]).ok();
        Self {
            id: Arc::from(id),
            inner: Arc::new(Mutex::new(SimState {
                id: id.to_string(),
                position: 0.0,
                duration,
                paused: true,
                muted: false,
                volume: 1.0,
                rate: 1.0,
                download_rate: 0.0,
                buffered,
                sink: None,
            })),
        }
    }

    /// Playback speed (1.0 = real time)
    pub fn with_rate(self, rate: f64) -> Self {
        self.inner.lock().unwrap().rate = rate;
        self
    }

    /// Start with nothing buffered and download at `rate` media seconds per second
    pub fn with_download_rate(self, rate: f64) -> Self {
        {
            let mut state = self.inner.lock().unwrap();
            state.download_rate = rate;
            state.buffered = Some(TimeRanges::new());
        }
        self
    }

    /// Route this player's events into a session
    pub fn attach(&self, sink: EventSink) {
        self.inner.lock().unwrap().sink = Some(sink);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> f64 {
        self.inner.lock().unwrap().position
    }

    /// Move the playhead without emitting events
    pub fn set_position(&self, position: f64) {
        self.inner.lock().unwrap().position = position;
    }

    pub fn length(&self) -> f64 {
        self.inner.lock().unwrap().duration
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().unwrap().paused
    }

    pub fn is_muted(&self) -> bool {
        self.inner.lock().unwrap().muted
    }

    pub fn current_volume(&self) -> f64 {
        self.inner.lock().unwrap().volume
    }

    pub fn buffered_ranges(&self) -> Option<TimeRanges> {
        self.inner.lock().unwrap().buffered.clone()
    }

    /// Replace buffered ranges; `None` simulates a player without buffer info
    pub fn set_buffered(&self, buffered: Option<TimeRanges>) {
        self.inner.lock().unwrap().buffered = buffered;
    }

    /// User or synchronizer pressing play
    pub fn press_play(&self) {
        let mut state = self.inner.lock().unwrap();
        if state.paused {
            state.paused = false;
            state.emit(PlayerEvent::Play);
        }
    }

    pub fn press_pause(&self) {
        let mut state = self.inner.lock().unwrap();
        if !state.paused {
            state.paused = true;
            state.emit(PlayerEvent::Pause);
        }
    }

    /// Seek; emits `timeupdate` like a media element does after seeking
    pub fn seek_to(&self, time: f64) {
        let mut state = self.inner.lock().unwrap();
        state.position = time.clamp(0.0, state.duration.max(0.0));
        state.emit(PlayerEvent::TimeUpdate);
    }

    pub fn announce_ready(&self) {
        self.inner.lock().unwrap().emit(PlayerEvent::Ready);
    }

    pub fn announce_loaded(&self) {
        self.inner.lock().unwrap().emit(PlayerEvent::LoadedData);
    }

    /// Advance the simulation clock by `elapsed` wall time
    ///
    /// Downloads more data, moves a playing playhead up to the buffered edge
    /// and emits `timeupdate`, or `timeupdate`/`pause`/`ended` when the end
    /// is reached.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.inner.lock().unwrap();
        let dt = elapsed.as_secs_f64();

        if state.download_rate > 0.0 {
            let position = state.position;
            let from = state.buffered_edge().unwrap_or(position);
            let until = (from + dt * state.download_rate).min(state.duration);
            if let Some(ranges) = state.buffered.as_mut() {
                let _ = ranges.add(position.min(until), until);
            }
        }

        if state.paused {
            return;
        }

        let limit = state.buffered_edge().unwrap_or(state.duration);
        let target = (state.position + dt * state.rate).min(limit).min(state.duration);
        if target <= state.position {
            trace!("'{}' stalled at {:.3}s", state.id, state.position);
            return;
        }

        state.position = target;
        state.emit(PlayerEvent::TimeUpdate);

        if state.position >= state.duration {
            state.paused = true;
            state.emit(PlayerEvent::Pause);
            state.emit(PlayerEvent::Ended);
        }
    }
}

impl NativeMediaElement for SimulatedPlayer {
    fn element_id(&self) -> &str {
        &self.id
    }

    fn play(&mut self) {
        self.press_play();
    }

    fn pause(&mut self) {
        self.press_pause();
    }

    fn paused(&self) -> bool {
        self.is_paused()
    }

    fn duration(&self) -> f64 {
        self.length()
    }

    fn current_time(&self) -> f64 {
        self.position()
    }

    fn set_current_time(&mut self, time: f64) {
        self.seek_to(time);
    }

    fn buffered(&self) -> Option<TimeRanges> {
        self.buffered_ranges()
    }

    fn set_muted(&mut self, muted: bool) {
        self.inner.lock().unwrap().muted = muted;
    }
}

impl WrappedPlayer for SimulatedPlayer {
    fn player_id(&self) -> &str {
        &self.id
    }

    fn play(&mut self) {
        self.press_play();
    }

    fn pause(&mut self) {
        self.press_pause();
    }

    fn paused(&self) -> bool {
        self.is_paused()
    }

    fn duration(&self) -> Option<f64> {
        Some(self.length())
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.position())
    }

    fn seek(&mut self, time: f64) {
        self.seek_to(time);
    }

    fn buffered(&self) -> Option<TimeRanges> {
        self.buffered_ranges()
    }

    fn volume(&self) -> f64 {
        self.current_volume()
    }

    fn set_volume(&mut self, volume: f64) {
        let mut state = self.inner.lock().unwrap();
        state.volume = volume;
        state.muted = volume == 0.0;
    }
}

/// A set of simulated players serving one backend
#[derive(Debug, Clone)]
pub struct SimulatedEnvironment {
    backend: Backend,
    players: Vec<(SimulatedPlayer, Option<String>)>,
}

impl SimulatedEnvironment {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            players: Vec::new(),
        }
    }

    /// Add a player, optionally tagged with a group
    pub fn with_player(mut self, player: SimulatedPlayer, group: Option<&str>) -> Self {
        self.players.push((player, group.map(str::to_string)));
        self
    }

    pub fn player(&self, id: &str) -> Option<&SimulatedPlayer> {
        self.players.iter().map(|(p, _)| p).find(|p| p.id() == id)
    }

    pub fn players(&self) -> impl Iterator<Item = &SimulatedPlayer> {
        self.players.iter().map(|(p, _)| p)
    }

    /// Route every player's events into a session
    pub fn attach_all(&self, sink: &EventSink) {
        for player in self.players() {
            player.attach(sink.clone());
        }
    }

    /// Every player reports `ready` followed by `loadeddata`
    pub fn announce_all_ready(&self) {
        for player in self.players() {
            player.announce_ready();
            player.announce_loaded();
        }
    }

    pub fn advance_all(&self, elapsed: Duration) {
        for player in self.players() {
            player.advance(elapsed);
        }
    }
}

impl MediaEnvironment for SimulatedEnvironment {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn resolve(&self, id: &str) -> Option<Box<dyn MediaPlayer>> {
        let player = self.player(id)?.clone();
        let adapter: Box<dyn MediaPlayer> = match self.backend {
            Backend::Native => Box::new(NativeElementAdapter::new(player)),
            Backend::Wrapped => Box::new(WrappedPlayerAdapter::new(player)),
        };
        Some(adapter)
    }

    fn group_members(&self, tag: &str) -> Vec<String> {
        self.players
            .iter()
            .filter(|(_, group)| group.as_deref() == Some(tag))
            .map(|(player, _)| match self.backend {
                Backend::Native => player.id().to_string(),
                Backend::Wrapped => format!("{}{}", player.id(), INNER_ELEMENT_SUFFIX),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{SessionInbox, SessionInput};

    fn drain_events(inbox: &mut SessionInbox) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        while let Some(input) = inbox.try_recv() {
            if let SessionInput::Player { event, .. } = input {
                events.push(event);
            }
        }
        events
    }

    #[test]
    fn test_advance_moves_playing_player_only() {
        let player = SimulatedPlayer::new("A", 10.0);
        player.advance(Duration::from_secs(1));
        assert_eq!(player.position(), 0.0);

        player.press_play();
        player.advance(Duration::from_millis(1500));
        assert!((player.position() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_rate_drift() {
        let player = SimulatedPlayer::new("A", 10.0).with_rate(1.1);
        player.press_play();
        player.advance(Duration::from_secs(2));
        assert!((player.position() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_stalls_at_buffered_edge() {
        let player = SimulatedPlayer::new("A", 60.0).with_download_rate(0.5);
        player.press_play();

        // 1s wall: 0.5s downloaded, playhead stops at the edge
        player.advance(Duration::from_secs(1));
        assert!((player.position() - 0.5).abs() < 1e-9);

        player.advance(Duration::from_secs(1));
        assert!((player.position() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_pauses_and_emits() {
        let (sink, mut inbox) = crate::sync::session::channel();
        let player = SimulatedPlayer::new("A", 1.0);
        player.attach(sink);
        player.press_play();
        player.advance(Duration::from_secs(2));

        assert!(player.is_paused());
        assert_eq!(player.position(), 1.0);
        let events: Vec<PlayerEvent> = drain_events(&mut inbox);
        assert_eq!(
            events,
            vec![
                PlayerEvent::Play,
                PlayerEvent::TimeUpdate,
                PlayerEvent::Pause,
                PlayerEvent::Ended
            ]
        );
    }

    #[test]
    fn test_play_twice_emits_once() {
        let (sink, mut inbox) = crate::sync::session::channel();
        let player = SimulatedPlayer::new("A", 5.0);
        player.attach(sink);
        player.press_play();
        player.press_play();
        player.press_pause();
        player.press_pause();

        let events: Vec<PlayerEvent> = drain_events(&mut inbox);
        assert_eq!(events, vec![PlayerEvent::Play, PlayerEvent::Pause]);
    }

    #[test]
    fn test_wrapped_group_members_have_inner_suffix() {
        let env = SimulatedEnvironment::new(Backend::Wrapped)
            .with_player(SimulatedPlayer::new("cam", 5.0), Some("g"))
            .with_player(SimulatedPlayer::new("slides", 5.0), None);
        assert_eq!(env.group_members("g"), vec!["cam_html5_api".to_string()]);
        assert!(env.resolve("slides").is_some());
        assert!(env.resolve("nope").is_none());
    }

    #[test]
    fn test_wrapped_volume_mute() {
        let env = SimulatedEnvironment::new(Backend::Wrapped)
            .with_player(SimulatedPlayer::new("cam", 5.0), None);
        let mut adapter = env.resolve("cam").unwrap();
        adapter.set_muted(true);
        let sim = env.player("cam").unwrap();
        assert!(sim.is_muted());
        assert_eq!(sim.current_volume(), 0.0);

        adapter.set_muted(false);
        assert!(!sim.is_muted());
        assert_eq!(sim.current_volume(), 1.0);
    }
}

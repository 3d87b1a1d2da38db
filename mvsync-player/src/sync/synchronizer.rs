//! Playback synchronizer
//!
//! Owns the registry, follows the master's events and keeps every follower
//! inside the drift window. A session runs in two phases:
//!
//! - **Registering**: players report readiness one by one. A user play on
//!   any player is held back (everything is re-paused) and remembered.
//! - **Synchronizing**: entered once every player is ready and
//!   initialized. Master events drive the followers; the buffer checker
//!   holds playback while data is missing.
//!
//! All methods run on one task and never block. Waiting is expressed as
//! re-evaluation on the next event or checker tick.

use mvsync_common::config::{MissingBufferPolicy, SyncConfig};
use mvsync_common::events::{EventBus, SyncCommand, SyncEvent};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::buffer::{is_buffered_enough, BufferCheckState, BufferOutcome};
use super::registry::{Registry, Selection};
use crate::error::Result;
use crate::player::{Backend, MediaEnvironment, MediaPlayer, PlayerEvent};

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Registering,
    Synchronizing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Registering => write!(f, "registering"),
            Phase::Synchronizing => write!(f, "synchronizing"),
        }
    }
}

/// True if `value` lies in `[lower, upper]`; false for NaN or inverted bounds
fn is_in_interval(value: f64, lower: f64, upper: f64) -> bool {
    if value.is_nan() || lower.is_nan() || upper.is_nan() || lower > upper {
        return false;
    }
    lower <= value && value <= upper
}

pub struct Synchronizer {
    config: SyncConfig,
    bus: EventBus,
    backend: Backend,
    registry: Registry,
    master: usize,
    phase: Phase,
    /// A user started playback before every player was ready
    start_clicked: bool,
    /// Players we paused during registration whose pause event is still due;
    /// kept across activation since the echo may arrive after it
    pause_echoes: Vec<bool>,
    buffer: BufferCheckState,
    last_sync: Option<Instant>,
}

impl Synchronizer {
    /// Register a group of players
    ///
    /// `master_index` selects the master among the registered players and
    /// falls back to 0 when out of range. Fails (after announcing the
    /// failure on the bus) if any identifier is invalid or fewer than two
    /// players remain.
    pub fn register(
        config: SyncConfig,
        bus: EventBus,
        env: &dyn MediaEnvironment,
        master_index: usize,
        selection: Selection,
    ) -> Result<Self> {
        config.validate()?;

        let backend = env.backend();
        let registry = Registry::build(env, selection, &bus)?;

        let master = if master_index < registry.len() {
            master_index
        } else {
            warn!(
                "Master index {} out of range for {} players, using 0",
                master_index,
                registry.len()
            );
            0
        };

        info!(
            "Registered {} players on {} backend, master will be '{}'",
            registry.len(),
            backend,
            registry.id(master)
        );

        let pause_echoes = vec![false; registry.len()];
        Ok(Self {
            config,
            bus,
            backend,
            registry,
            master,
            phase: Phase::Registering,
            start_clicked: false,
            pause_echoes,
            buffer: BufferCheckState::new(),
            last_sync: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn master_id(&self) -> &str {
        self.registry.id(self.master)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn player(&self, id: &str) -> Option<&dyn MediaPlayer> {
        self.registry.index_of(id).map(|i| self.registry.player(i))
    }

    pub fn start_clicked(&self) -> bool {
        self.start_clicked
    }

    pub fn buffer_state(&self) -> BufferCheckState {
        self.buffer
    }

    /// Every player is ready and initialized and the permanent wiring is active
    pub fn is_all_initialized(&self) -> bool {
        self.phase == Phase::Synchronizing
    }

    // ========================================
    // Event dispatch
    // ========================================

    /// Feed one player event into the state machine
    pub fn handle_player_event(&mut self, id: &str, event: PlayerEvent) {
        let Some(index) = self.registry.index_of(id) else {
            debug!("Ignoring {} from unregistered player '{}'", event, id);
            return;
        };

        if event == PlayerEvent::Pause && std::mem::replace(&mut self.pause_echoes[index], false) {
            debug!("Consumed pause echo from '{}'", id);
            return;
        }

        match event {
            PlayerEvent::Ready => self.on_ready(index),
            PlayerEvent::LoadedData => self.on_loaded_data(index),
            _ => match self.phase {
                Phase::Registering => self.on_initial_event(index, event),
                Phase::Synchronizing if index == self.master => self.on_master_event(event),
                Phase::Synchronizing => self.on_follower_event(index, event),
            },
        }
    }

    /// Apply an external control signal
    ///
    /// Dropped until every player is initialized.
    pub fn handle_command(&mut self, command: SyncCommand) {
        if !self.is_all_initialized() {
            debug!("Ignoring {} before all players are initialized", command);
            return;
        }

        debug!("Command: {}", command);
        match command {
            SyncCommand::Play => self.registry.player_mut(self.master).play(),
            SyncCommand::Pause => self.registry.player_mut(self.master).pause(),
            SyncCommand::SeekTo { time } => {
                if !self.registry.player_mut(self.master).seek_clamped(time) {
                    debug!("Master seek to {} was clamped or rejected", time);
                }
            }
            SyncCommand::Synchronize => {
                self.synchronize();
            }
            SyncCommand::StartBufferChecker => self.start_buffer_checker(),
            SyncCommand::StopBufferChecker => self.stop_buffer_checker(),
        }
    }

    // ========================================
    // Registration phase
    // ========================================

    fn on_ready(&mut self, index: usize) {
        if self.registry.mark_ready(index, self.backend) {
            self.announce_loaded(index);
        }
        self.try_activate();
    }

    fn on_loaded_data(&mut self, index: usize) {
        if self.backend == Backend::Native {
            // Native elements are initialized by their ready signal
            return;
        }
        if self.registry.mark_initialized(index) {
            self.announce_loaded(index);
        }
        self.try_activate();
    }

    fn announce_loaded(&self, index: usize) {
        let id = self.registry.id(index).to_string();
        debug!("Player '{}' loaded", id);
        self.bus.emit_lossy(SyncEvent::PlayerLoaded { id });
    }

    fn try_activate(&mut self) {
        if self.phase != Phase::Registering
            || !self.registry.all_ready()
            || !self.registry.all_initialized()
        {
            return;
        }

        let master_id = self.master_id().to_string();
        info!("Master set to '{}'", master_id);
        self.bus.emit_lossy(SyncEvent::MasterSet { id: master_id });

        self.phase = Phase::Synchronizing;

        if self.start_clicked {
            info!("Start was requested during loading, starting playback");
            self.registry.player_mut(self.master).play();
        }

        info!("All {} players ready", self.registry.len());
        self.bus.emit_lossy(SyncEvent::AllPlayersReady);
    }

    /// Play/pause on any player before everything is ready
    fn on_initial_event(&mut self, index: usize, event: PlayerEvent) {
        match event {
            PlayerEvent::Play => {
                debug!(
                    "Player '{}' started before all players were ready, holding playback",
                    self.registry.id(index)
                );
                self.hold_all();
                self.start_clicked = true;
            }
            PlayerEvent::Pause => {
                self.hold_all();
                self.start_clicked = false;
            }
            _ => {}
        }
    }

    /// Pause every player, remembering which ones will echo a pause event
    fn hold_all(&mut self) {
        for index in 0..self.registry.len() {
            let player = self.registry.player_mut(index);
            if !player.is_paused() {
                self.pause_echoes[index] = true;
                player.pause();
            }
        }
    }

    // ========================================
    // Synchronizing phase
    // ========================================

    fn on_master_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Play => self.on_master_play(),
            PlayerEvent::Pause => self.on_master_pause(),
            PlayerEvent::Ended => self.on_master_ended(),
            PlayerEvent::TimeUpdate => self.on_master_timeupdate(),
            PlayerEvent::Ready | PlayerEvent::LoadedData => {}
        }
    }

    /// Followers only react to their own play: muted so audio never overlaps
    fn on_follower_event(&mut self, index: usize, event: PlayerEvent) {
        if event == PlayerEvent::Play {
            self.registry.player_mut(index).set_muted(true);
        }
    }

    fn followers(&self) -> impl Iterator<Item = usize> {
        let master = self.master;
        (0..self.registry.len()).filter(move |&i| i != master)
    }

    fn on_master_play(&mut self) {
        let time = self.registry.player(self.master).current_time();
        self.bus.emit_lossy(SyncEvent::MasterPlay { time });

        self.buffer.set_paused_while_buffering(false);
        self.start_buffer_checker();

        let followers: Vec<usize> = self.followers().collect();
        for index in followers {
            self.registry.player_mut(index).play();
        }
    }

    fn on_master_pause(&mut self) {
        let time = self.registry.player(self.master).current_time();
        self.bus.emit_lossy(SyncEvent::MasterPause { time });

        self.buffer.on_master_pause();

        // Re-seek first: a successful correction resumes the follower, the
        // pause below must be the last word. Pausing before the re-seek would
        // leave a corrected follower playing behind a paused master.
        let followers: Vec<usize> = self.followers().collect();
        for index in followers {
            self.synchronize_follower(index);
            self.registry.player_mut(index).pause();
        }
    }

    fn on_master_ended(&mut self) {
        let duration = self.registry.player(self.master).duration();
        self.bus.emit_lossy(SyncEvent::MasterEnded { duration });

        self.buffer.set_paused_while_buffering(true);

        let followers: Vec<usize> = self.followers().collect();
        for index in followers {
            self.synchronize_follower(index);
            self.registry.player_mut(index).pause();
        }
    }

    fn on_master_timeupdate(&mut self) {
        let time = self.registry.player(self.master).current_time();
        self.bus.emit_lossy(SyncEvent::MasterTimeupdate { time });

        self.buffer.set_paused_while_buffering(true);

        let now = Instant::now();
        let due = self
            .last_sync
            .map_or(true, |last| now.duration_since(last) > self.config.sync_interval());
        if !due && !self.registry.player(self.master).is_paused() {
            return;
        }
        self.last_sync = Some(now);

        let followers: Vec<usize> = self.followers().collect();
        for index in followers {
            self.registry.player_mut(index).set_muted(true);
            let was_paused = self.registry.player(index).is_paused();
            self.synchronize_follower(index);
            if was_paused || self.registry.player(self.master).is_paused() {
                self.registry.player_mut(index).pause();
            }
        }
    }

    // ========================================
    // Synchronization pass
    // ========================================

    /// Run a synchronization pass over all followers
    ///
    /// Returns the number of followers that were re-seeked.
    pub fn synchronize(&mut self) -> usize {
        let followers: Vec<usize> = self.followers().collect();
        followers
            .into_iter()
            .filter(|&index| self.synchronize_follower(index))
            .count()
    }

    /// Bring one follower back into `[master - gap, master]`
    ///
    /// A follower ahead of the master by any amount, or behind by more than
    /// the gap, is seeked to the master position and resumed. A seek past
    /// the follower's own duration leaves it at its end without resuming.
    fn synchronize_follower(&mut self, index: usize) -> bool {
        let Some(master_time) = self.registry.player(self.master).current_time() else {
            return false;
        };
        let Some(follower_time) = self.registry.player(index).current_time() else {
            return false;
        };

        let gap = self.config.sync_gap_secs;
        if is_in_interval(follower_time, master_time - gap, master_time) {
            return false;
        }

        let target_id = self.registry.id(index).to_string();
        debug!(
            "Synchronizing '{}' from {:.3}s to {:.3}s",
            target_id, follower_time, master_time
        );
        self.bus.emit_lossy(SyncEvent::Synchronizing {
            time: master_time,
            target_id,
        });

        let follower = self.registry.player_mut(index);
        if follower.seek_clamped(master_time) {
            follower.play();
        } else {
            debug!(
                "Seek to {:.3}s out of range for '{}', left at end",
                master_time,
                self.registry.id(index)
            );
        }
        true
    }

    // ========================================
    // Buffer checker
    // ========================================

    pub fn buffer_checker_running(&self) -> bool {
        self.buffer.is_running()
    }

    pub fn start_buffer_checker(&mut self) {
        if self.buffer.start() {
            debug!(
                "Buffer checker started ({}ms interval)",
                self.config.buffer_check_interval_ms
            );
        }
    }

    pub fn stop_buffer_checker(&mut self) {
        if self.buffer.stop() {
            debug!("Buffer checker stopped");
        }
    }

    /// One buffer checker tick; no-op while the checker is stopped
    pub fn check_buffers(&mut self) -> BufferOutcome {
        if !self.buffer.is_running() {
            return BufferOutcome::Steady;
        }

        let lookahead = self.config.buffer_lookahead_secs;
        let mut all_buffered = true;
        for (index, player) in self.registry.players().enumerate() {
            match is_buffered_enough(player, lookahead) {
                Some(buffered) => all_buffered &= buffered,
                None => match self.config.missing_buffer_info {
                    MissingBufferPolicy::Ignore => {
                        debug!(
                            "Player '{}' reports no buffered ranges, skipping",
                            self.registry.id(index)
                        );
                    }
                    MissingBufferPolicy::Stall => all_buffered = false,
                },
            }
        }

        let outcome = self.buffer.evaluate(all_buffered);
        match outcome {
            BufferOutcome::Buffering => {
                debug!("Waiting for players to buffer");
                self.bus.emit_lossy(SyncEvent::Buffering);
            }
            BufferOutcome::ResumeMaster => {
                info!("Buffered, resuming master");
                self.registry.player_mut(self.master).play();
                self.bus.emit_lossy(SyncEvent::ResumedAfterBuffering);
            }
            BufferOutcome::BufferedNotAutoplaying => {
                info!("Buffered, but playback was paused meanwhile; not resuming");
                self.bus.emit_lossy(SyncEvent::BufferedButNotAutoplaying);
            }
            BufferOutcome::Steady => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds_inclusive() {
        assert!(is_in_interval(9.0, 9.0, 10.0));
        assert!(is_in_interval(10.0, 9.0, 10.0));
        assert!(is_in_interval(9.5, 9.0, 10.0));
        assert!(!is_in_interval(8.5, 9.0, 10.0));
        assert!(!is_in_interval(10.5, 9.0, 10.0));
    }

    #[test]
    fn test_interval_rejects_nan_and_inverted() {
        assert!(!is_in_interval(f64::NAN, 0.0, 1.0));
        assert!(!is_in_interval(0.5, 1.0, 0.0));
    }
}

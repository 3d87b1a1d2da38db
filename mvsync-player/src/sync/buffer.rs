//! Buffer readiness check
//!
//! Session-wide buffering flags and the transition rules the periodic
//! checker applies to them.

use crate::player::MediaPlayer;

/// What the checker decided on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOutcome {
    /// Some player is short on buffered data
    Buffering,
    /// Buffering cleared; the master should be resumed
    ResumeMaster,
    /// Buffering cleared but the master was paused meanwhile
    BufferedNotAutoplaying,
    /// Nothing pending, nothing to do
    Steady,
}

/// Buffer checker state
///
/// `running` says whether the periodic timer is armed. The remaining flags
/// only change through the transitions below.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferCheckState {
    running: bool,
    pending_buffer: bool,
    paused_while_buffering: bool,
    ignore_next_pause: bool,
}

impl BufferCheckState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Playback is waiting for buffers to fill
    pub fn is_pending(&self) -> bool {
        self.pending_buffer
    }

    pub fn paused_while_buffering(&self) -> bool {
        self.paused_while_buffering
    }

    pub fn ignores_next_pause(&self) -> bool {
        self.ignore_next_pause
    }

    /// Arm the checker; returns false if it was already running
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Disarm the checker; returns false if it was not running
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub fn set_paused_while_buffering(&mut self, value: bool) {
        self.paused_while_buffering = value;
    }

    /// Master pause: counts as a buffering pause unless it is the one pause
    /// the checker asked to ignore. The ignore flag is consumed either way.
    pub fn on_master_pause(&mut self) {
        self.paused_while_buffering = !self.ignore_next_pause && self.pending_buffer;
        self.ignore_next_pause = false;
    }

    /// Apply one checker tick
    pub fn evaluate(&mut self, all_buffered: bool) -> BufferOutcome {
        if !all_buffered {
            self.pending_buffer = true;
            self.ignore_next_pause = true;
            self.paused_while_buffering = false;
            BufferOutcome::Buffering
        } else if self.pending_buffer && !self.paused_while_buffering {
            self.pending_buffer = false;
            BufferOutcome::ResumeMaster
        } else if self.pending_buffer {
            self.pending_buffer = false;
            BufferOutcome::BufferedNotAutoplaying
        } else {
            BufferOutcome::Steady
        }
    }
}

/// Whether a player has `lookahead` seconds buffered past its position
///
/// The look-ahead target is clamped to the duration so players near the end
/// still count as buffered. Returns `None` when the player exposes no
/// buffered-range information.
pub fn is_buffered_enough(player: &dyn MediaPlayer, lookahead: f64) -> Option<bool> {
    let ranges = player.buffered()?;

    let Some(position) = player.current_time() else {
        return Some(false);
    };

    let mut target = position + lookahead;
    if let Some(duration) = player.duration() {
        if target >= duration {
            target = duration;
        }
    }

    Some(ranges.contains(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::TimeRanges;
    use crate::sim::SimulatedPlayer;
    use crate::player::NativeElementAdapter;

    #[test]
    fn test_start_stop_idempotent() {
        let mut state = BufferCheckState::new();
        assert!(state.start());
        assert!(!state.start());
        assert!(state.is_running());

        assert!(state.stop());
        assert!(!state.stop());
        assert!(!state.is_running());
    }

    #[test]
    fn test_stall_then_resume() {
        let mut state = BufferCheckState::new();
        assert_eq!(state.evaluate(true), BufferOutcome::Steady);

        assert_eq!(state.evaluate(false), BufferOutcome::Buffering);
        assert!(state.is_pending());
        assert!(state.ignores_next_pause());
        assert!(!state.paused_while_buffering());

        assert_eq!(state.evaluate(true), BufferOutcome::ResumeMaster);
        assert!(!state.is_pending());
        assert_eq!(state.evaluate(true), BufferOutcome::Steady);
    }

    #[test]
    fn test_pause_during_buffering_defers_resume() {
        let mut state = BufferCheckState::new();
        state.evaluate(false);

        // First pause is the ignored one
        state.on_master_pause();
        assert!(!state.paused_while_buffering());
        assert!(!state.ignores_next_pause());

        // Second pause while still pending is a real one
        state.on_master_pause();
        assert!(state.paused_while_buffering());

        assert_eq!(state.evaluate(true), BufferOutcome::BufferedNotAutoplaying);
        assert!(!state.is_pending());
    }

    #[test]
    fn test_pause_without_pending_is_not_buffering_pause() {
        let mut state = BufferCheckState::new();
        state.on_master_pause();
        assert!(!state.paused_while_buffering());
    }

    #[test]
    fn test_buffered_enough_lookahead() {
        let sim = SimulatedPlayer::new("A", 60.0);
        sim.set_position(10.0);
        sim.set_buffered(Some(TimeRanges::from_ranges([(0.0, 11.4)]).unwrap()));
        let player = NativeElementAdapter::new(sim.clone());
        assert_eq!(is_buffered_enough(&player, 1.5), Some(false));

        sim.set_buffered(Some(TimeRanges::from_ranges([(0.0, 11.5)]).unwrap()));
        assert_eq!(is_buffered_enough(&player, 1.5), Some(true));
    }

    #[test]
    fn test_buffered_enough_clamps_to_duration() {
        let sim = SimulatedPlayer::new("A", 60.0);
        sim.set_position(59.5);
        sim.set_buffered(Some(TimeRanges::from_ranges([(50.0, 60.0)]).unwrap()));
        let player = NativeElementAdapter::new(sim);
        assert_eq!(is_buffered_enough(&player, 1.5), Some(true));
    }

    #[test]
    fn test_no_buffer_info() {
        let sim = SimulatedPlayer::new("A", 60.0);
        sim.set_buffered(None);
        let player = NativeElementAdapter::new(sim);
        assert_eq!(is_buffered_enough(&player, 1.5), None);
    }
}

//! Test helpers for synchronizer integration tests
//!
//! [`Harness`] drives a [`Synchronizer`] by hand: simulated players queue
//! their events into a session inbox and [`Harness::pump`] feeds them in
//! until nothing is left.

#![allow(dead_code)]

use mvsync_common::events::{EventBus, SyncEvent};
use mvsync_common::SyncConfig;
use mvsync_player::player::Backend;
use mvsync_player::sim::{SimulatedEnvironment, SimulatedPlayer};
use mvsync_player::sync::{session, EventSink, SessionInbox, SessionInput, Selection};
use mvsync_player::Synchronizer;
use tokio::sync::broadcast;

/// Environment with one 60s player per id, all tagged "lecture"
pub fn environment(backend: Backend, ids: &[&str]) -> SimulatedEnvironment {
    ids.iter().fold(SimulatedEnvironment::new(backend), |env, id| {
        env.with_player(SimulatedPlayer::new(id, 60.0), Some("lecture"))
    })
}

pub fn ids(ids: &[&str]) -> Selection {
    Selection::Ids(ids.iter().map(|id| id.to_string()).collect())
}

pub fn drain(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub struct Harness {
    pub env: SimulatedEnvironment,
    pub sync: Synchronizer,
    pub sink: EventSink,
    pub inbox: SessionInbox,
    pub events: broadcast::Receiver<SyncEvent>,
}

impl Harness {
    pub fn new(env: SimulatedEnvironment, master: usize, selection: Selection) -> Self {
        Self::with_config(SyncConfig::default(), env, master, selection)
    }

    pub fn with_config(
        config: SyncConfig,
        env: SimulatedEnvironment,
        master: usize,
        selection: Selection,
    ) -> Self {
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let (sink, inbox) = session::channel();
        env.attach_all(&sink);

        let sync = Synchronizer::register(config, bus, &env, master, selection)
            .expect("Registration should succeed");

        Self {
            env,
            sync,
            sink,
            inbox,
            events,
        }
    }

    /// Registered, every player ready, notifications drained
    pub fn ready(env: SimulatedEnvironment, master: usize, selection: Selection) -> Self {
        let mut harness = Self::new(env, master, selection);
        harness.env.announce_all_ready();
        harness.pump();
        assert!(harness.sync.is_all_initialized());
        harness.drain();
        harness
    }

    /// Feed every queued input into the synchronizer, including the ones it
    /// causes along the way
    pub fn pump(&mut self) {
        while let Some(input) = self.inbox.try_recv() {
            match input {
                SessionInput::Player { id, event } => self.sync.handle_player_event(&id, event),
                SessionInput::Command(command) => self.sync.handle_command(command),
                SessionInput::Shutdown => break,
            }
        }
    }

    pub fn drain(&mut self) -> Vec<SyncEvent> {
        drain(&mut self.events)
    }

    pub fn player(&self, id: &str) -> &SimulatedPlayer {
        self.env.player(id).expect("Unknown simulated player")
    }
}

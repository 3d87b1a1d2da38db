//! Session driver
//!
//! Runs a [`Synchronizer`] on a single tokio task. Player events and
//! commands arrive over one channel and are applied strictly in order; the
//! buffer checker interval is armed only while the synchronizer says it is
//! running.

use std::time::Duration;

use mvsync_common::events::SyncCommand;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::synchronizer::Synchronizer;
use crate::error::{Error, Result};
use crate::player::PlayerEvent;

/// Input to a running session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Player { id: String, event: PlayerEvent },
    Command(SyncCommand),
    Shutdown,
}

/// Sending side of a session; cheap to clone and hand to players
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionInput>,
}

impl EventSink {
    /// Report a player event
    pub fn player_event(&self, id: &str, event: PlayerEvent) -> Result<()> {
        self.send(SessionInput::Player {
            id: id.to_string(),
            event,
        })
    }

    /// Push a control signal
    pub fn command(&self, command: SyncCommand) -> Result<()> {
        self.send(SessionInput::Command(command))
    }

    /// Ask the session task to stop
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionInput::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, input: SessionInput) -> Result<()> {
        self.tx.send(input).map_err(|_| Error::SessionClosed)
    }
}

/// Receiving side of a session, consumed by [`run`] or [`spawn`]
pub struct SessionInbox {
    rx: mpsc::UnboundedReceiver<SessionInput>,
}

impl SessionInbox {
    /// Take the next queued input without waiting
    ///
    /// For callers that drive a [`Synchronizer`] by hand instead of running
    /// the session loop.
    pub fn try_recv(&mut self) -> Option<SessionInput> {
        self.rx.try_recv().ok()
    }
}

/// Create the input channel
///
/// The sink exists before the synchronizer so players can be wired to it
/// while they are still being created.
pub fn channel() -> (EventSink, SessionInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, SessionInbox { rx })
}

/// Run the session on a new task; the task returns the synchronizer on shutdown
pub fn spawn(synchronizer: Synchronizer, inbox: SessionInbox) -> JoinHandle<Synchronizer> {
    tokio::spawn(run(synchronizer, inbox))
}

/// Session loop
///
/// Ends on [`SessionInput::Shutdown`] or when every sink is dropped. The
/// buffer checker is stopped on the way out.
pub async fn run(mut synchronizer: Synchronizer, mut inbox: SessionInbox) -> Synchronizer {
    let period = synchronizer.config().buffer_check_interval();
    let mut checker: Option<Interval> = None;

    info!("Synchronization session started");

    loop {
        match (synchronizer.buffer_checker_running(), checker.is_some()) {
            (true, false) => checker = Some(buffer_interval(period)),
            (false, true) => checker = None,
            _ => {}
        }

        tokio::select! {
            input = inbox.rx.recv() => match input {
                Some(SessionInput::Player { id, event }) => {
                    synchronizer.handle_player_event(&id, event);
                }
                Some(SessionInput::Command(command)) => {
                    synchronizer.handle_command(command);
                }
                Some(SessionInput::Shutdown) | None => break,
            },
            _ = next_tick(&mut checker) => {
                synchronizer.check_buffers();
            }
        }
    }

    synchronizer.stop_buffer_checker();
    info!("Synchronization session stopped");
    synchronizer
}

/// Checker interval whose first tick is one period from now
fn buffer_interval(period: Duration) -> Interval {
    debug!("Arming buffer checker interval ({:?})", period);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(checker: &mut Option<Interval>) {
    match checker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

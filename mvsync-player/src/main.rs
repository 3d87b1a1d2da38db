//! Synchronization simulator (mvsync-sim) - Main entry point
//!
//! Builds a group of simulated players with diverging playback rates, runs a
//! synchronization session over them for a fixed wall time and prints every
//! notification as one JSON line on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mvsync_common::events::{EventBus, SyncCommand, SyncEvent};
use mvsync_common::{time, SyncConfig};
use mvsync_player::player::Backend;
use mvsync_player::sim::{SimulatedEnvironment, SimulatedPlayer};
use mvsync_player::sync::{session, EventSink, Selection};
use mvsync_player::Synchronizer;
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Native,
    Wrapped,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Native => Backend::Native,
            BackendArg::Wrapped => Backend::Wrapped,
        }
    }
}

/// Command-line arguments for mvsync-sim
#[derive(Parser, Debug)]
#[command(name = "mvsync-sim")]
#[command(about = "Run a simulated multi-video synchronization session")]
#[command(version)]
struct Args {
    /// Config file (overrides MVSYNC_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Player identifiers, in registration order
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_value = "presenter,presentation,camera"
    )]
    players: Vec<String>,

    /// Register every player through this group tag instead of by id
    #[arg(short, long)]
    group: Option<String>,

    /// Index of the master player
    #[arg(short, long, default_value = "0")]
    master: usize,

    /// Media duration of every player, in seconds
    #[arg(long, default_value = "120")]
    duration: f64,

    /// Extra playback rate per follower (follower n plays at 1 + n * drift)
    #[arg(long, default_value = "0.05")]
    drift: f64,

    /// Start with empty buffers that fill at this many media seconds per second
    #[arg(long)]
    download_rate: Option<f64>,

    /// Player backend to simulate
    #[arg(short, long, value_enum, default_value = "native")]
    backend: BackendArg,

    /// Wall time to run the session, in seconds
    #[arg(long, default_value = "30")]
    run_secs: f64,

    /// Simulation clock step, in milliseconds
    #[arg(long, default_value = "250")]
    tick_ms: u64,

    /// Send a play command once every player is ready
    #[arg(long)]
    autoplay: bool,

    /// Press play on the master before the players report ready
    #[arg(long)]
    early_start: bool,

    /// Also print master-timeupdate notifications
    #[arg(short, long)]
    verbose_events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = SyncConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    let default_filter = format!(
        "mvsync_player={level},mvsync_common={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let run_for = time::secs_to_duration(args.run_secs)
        .context("--run-secs must be a non-negative number")?;
    let tick = time::millis_to_duration(args.tick_ms.max(1));

    info!(
        "Starting mvsync-sim: {} players, {} backend, master index {}",
        args.players.len(),
        Backend::from(args.backend),
        args.master
    );

    let env = build_environment(&args);
    let bus = EventBus::new(config.event_bus_capacity);
    let mut events = bus.subscribe();

    let (sink, inbox) = session::channel();
    env.attach_all(&sink);

    let selection = match &args.group {
        Some(tag) => Selection::Group(tag.clone()),
        None => Selection::Ids(args.players.clone()),
    };

    let synchronizer = match Synchronizer::register(config, bus, &env, args.master, selection) {
        Ok(synchronizer) => synchronizer,
        Err(e) => {
            // Flush the setup notifications before bailing out
            while let Ok(event) = events.try_recv() {
                print_event(&event, args.verbose_events);
            }
            return Err(e).context("Failed to register players");
        }
    };

    let session = session::spawn(synchronizer, inbox);
    let printer = tokio::spawn(print_events(
        events,
        sink.clone(),
        args.autoplay,
        args.verbose_events,
    ));

    let clock = {
        let env = env.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                env.advance_all(tick);
            }
        })
    };

    if args.early_start {
        if let Some(master) = env.players().nth(args.master) {
            info!("Pressing play on '{}' before players are ready", master.id());
            master.press_play();
        }
    }
    env.announce_all_ready();

    tokio::select! {
        _ = tokio::time::sleep(run_for) => {
            info!("Run time elapsed");
        }
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        },
    }

    clock.abort();
    sink.shutdown().context("Session stopped unexpectedly")?;
    let synchronizer = session.await.context("Session task failed")?;

    for player in env.players() {
        info!(
            "'{}' at {:.3}s ({})",
            player.id(),
            player.position(),
            if player.is_paused() { "paused" } else { "playing" }
        );
    }

    // Dropping the last bus sender ends the printer
    drop(synchronizer);
    drop(sink);
    printer.await.context("Event printer failed")?;

    info!("Simulation complete");
    Ok(())
}

fn build_environment(args: &Args) -> SimulatedEnvironment {
    let mut env = SimulatedEnvironment::new(args.backend.into());
    let mut follower = 0u32;

    for (index, id) in args.players.iter().enumerate() {
        let rate = if index == args.master {
            1.0
        } else {
            follower += 1;
            1.0 + args.drift * f64::from(follower)
        };

        let mut player = SimulatedPlayer::new(id, args.duration).with_rate(rate);
        if let Some(download_rate) = args.download_rate {
            player = player.with_download_rate(download_rate);
        }
        env = env.with_player(player, args.group.as_deref());
    }

    env
}

/// Print notifications until the bus closes
async fn print_events(
    mut events: broadcast::Receiver<SyncEvent>,
    sink: EventSink,
    autoplay: bool,
    verbose: bool,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                print_event(&event, verbose);
                if autoplay && event == SyncEvent::AllPlayersReady {
                    if let Err(e) = sink.command(SyncCommand::Play) {
                        warn!("Failed to send play command: {}", e);
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event printer lagged, {} notifications skipped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &SyncEvent, verbose: bool) {
    if !verbose && matches!(event, SyncEvent::MasterTimeupdate { .. }) {
        return;
    }

    let line = serde_json::json!({
        "at": time::now(),
        "event": event,
    });
    println!("{}", line);
}

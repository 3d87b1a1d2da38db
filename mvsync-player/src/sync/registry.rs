//! Player registry and per-player readiness

use mvsync_common::events::{EventBus, SyncEvent};
use tracing::{debug, warn};

use crate::error::{Result, SetupError};
use crate::player::wrapped::player_id_from_element_id;
use crate::player::{Backend, MediaEnvironment, MediaPlayer};

/// Which players to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit identifiers, in registration order
    Ids(Vec<String>),
    /// Every element carrying this group tag
    Group(String),
}

/// Readiness flags of one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// Player object constructed/attached
    pub ready: bool,
    /// Media data loaded
    pub initialized: bool,
}

impl Readiness {
    pub fn is_complete(&self) -> bool {
        self.ready && self.initialized
    }
}

struct Entry {
    id: String,
    player: Box<dyn MediaPlayer>,
    readiness: Readiness,
}

/// Registered players in registration order
///
/// Identifiers are unique and the length is fixed once built.
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Validate the selection against the environment and build the registry
    ///
    /// Every unresolvable or duplicate identifier is announced with
    /// `invalid-id`. Any invalid identifier, or fewer than two players,
    /// aborts with `not-enough-videos`. On success each identifier is
    /// announced with `registering-id`.
    pub fn build(env: &dyn MediaEnvironment, selection: Selection, bus: &EventBus) -> Result<Self> {
        let backend = env.backend();
        let candidates: Vec<String> = match selection {
            Selection::Ids(ids) => ids,
            Selection::Group(tag) => {
                let members = env.group_members(&tag);
                debug!("Group '{}' has {} member element(s)", tag, members.len());
                members
                    .iter()
                    .map(|element_id| match backend {
                        Backend::Native => element_id.clone(),
                        Backend::Wrapped => player_id_from_element_id(element_id).to_string(),
                    })
                    .collect()
            }
        };

        let mut entries: Vec<Entry> = Vec::with_capacity(candidates.len());
        let mut invalid = Vec::new();

        for id in candidates {
            let duplicate = entries.iter().any(|e| e.id == id);
            let player = if id.is_empty() || duplicate {
                None
            } else {
                env.resolve(&id)
            };

            match player {
                Some(player) => entries.push(Entry {
                    id,
                    player,
                    readiness: Readiness::default(),
                }),
                None => {
                    warn!("Invalid player id '{}'", id);
                    bus.emit_lossy(SyncEvent::InvalidId { id: id.clone() });
                    invalid.push(id);
                }
            }
        }

        if !invalid.is_empty() {
            bus.emit_lossy(SyncEvent::NotEnoughVideos);
            return Err(SetupError::InvalidIds(invalid).into());
        }

        if entries.len() < 2 {
            warn!("Need at least 2 players to synchronize, found {}", entries.len());
            bus.emit_lossy(SyncEvent::NotEnoughVideos);
            return Err(SetupError::NotEnoughPlayers {
                found: entries.len(),
            }
            .into());
        }

        for entry in &entries {
            debug!("Registering player '{}'", entry.id);
            bus.emit_lossy(SyncEvent::RegisteringId {
                id: entry.id.clone(),
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn id(&self, index: usize) -> &str {
        &self.entries[index].id
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn player(&self, index: usize) -> &dyn MediaPlayer {
        self.entries[index].player.as_ref()
    }

    pub fn player_mut(&mut self, index: usize) -> &mut dyn MediaPlayer {
        self.entries[index].player.as_mut()
    }

    pub fn players(&self) -> impl Iterator<Item = &dyn MediaPlayer> {
        self.entries.iter().map(|e| e.player.as_ref())
    }

    pub fn readiness(&self, index: usize) -> Readiness {
        self.entries[index].readiness
    }

    /// Record the `ready` signal; returns true if the player became initialized by it
    ///
    /// Native elements carry their data by the time they are ready, so the
    /// native backend sets both flags at once.
    pub fn mark_ready(&mut self, index: usize, backend: Backend) -> bool {
        let readiness = &mut self.entries[index].readiness;
        readiness.ready = true;
        if backend == Backend::Native && !readiness.initialized {
            readiness.initialized = true;
            return true;
        }
        false
    }

    /// Record the `loadeddata` signal; returns true if this is the first one
    pub fn mark_initialized(&mut self, index: usize) -> bool {
        let readiness = &mut self.entries[index].readiness;
        let first = !readiness.initialized;
        readiness.initialized = true;
        first
    }

    pub fn all_ready(&self) -> bool {
        self.entries.iter().all(|e| e.readiness.ready)
    }

    pub fn all_initialized(&self) -> bool {
        self.entries.iter().all(|e| e.readiness.initialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimulatedEnvironment, SimulatedPlayer};

    fn env(backend: Backend) -> SimulatedEnvironment {
        SimulatedEnvironment::new(backend)
            .with_player(SimulatedPlayer::new("A", 60.0), Some("lecture"))
            .with_player(SimulatedPlayer::new("B", 60.0), Some("lecture"))
            .with_player(SimulatedPlayer::new("C", 60.0), None)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_build_from_ids_keeps_order() {
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();
        let ids = vec!["C".to_string(), "A".to_string()];

        let registry = Registry::build(&env(Backend::Native), Selection::Ids(ids), &bus).unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["C", "A"]);
        assert_eq!(registry.index_of("A"), Some(1));
        assert_eq!(
            drain(&mut rx),
            vec![
                SyncEvent::RegisteringId { id: "C".into() },
                SyncEvent::RegisteringId { id: "A".into() },
            ]
        );
    }

    #[test]
    fn test_build_from_group_wrapped_strips_suffix() {
        let bus = EventBus::new(32);
        let registry = Registry::build(
            &env(Backend::Wrapped),
            Selection::Group("lecture".into()),
            &bus,
        )
        .unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_id_is_invalid() {
        let bus = EventBus::new(32);
        let mut rx = bus.subscribe();
        let ids = vec!["A".to_string(), "B".to_string(), "A".to_string()];

        let err = Registry::build(&env(Backend::Native), Selection::Ids(ids), &bus)
            .err()
            .unwrap();

        match err {
            crate::Error::Setup(SetupError::InvalidIds(ids)) => assert_eq!(ids, vec!["A".to_string()]),
            other => panic!("Expected InvalidIds, got {:?}", other),
        }
        assert_eq!(
            drain(&mut rx),
            vec![
                SyncEvent::InvalidId { id: "A".into() },
                SyncEvent::NotEnoughVideos,
            ]
        );
    }

    #[test]
    fn test_native_ready_sets_both_flags() {
        let bus = EventBus::new(32);
        let ids = vec!["A".to_string(), "B".to_string()];
        let mut registry = Registry::build(&env(Backend::Native), Selection::Ids(ids), &bus).unwrap();

        assert!(registry.mark_ready(0, Backend::Native));
        assert!(registry.readiness(0).is_complete());
        // Repeated ready does not re-initialize
        assert!(!registry.mark_ready(0, Backend::Native));
        assert!(!registry.all_ready());
    }

    #[test]
    fn test_wrapped_needs_loaded_data() {
        let bus = EventBus::new(32);
        let ids = vec!["A".to_string(), "B".to_string()];
        let mut registry = Registry::build(&env(Backend::Wrapped), Selection::Ids(ids), &bus).unwrap();

        assert!(!registry.mark_ready(0, Backend::Wrapped));
        assert!(!registry.mark_ready(1, Backend::Wrapped));
        assert!(registry.all_ready());
        assert!(!registry.all_initialized());

        assert!(registry.mark_initialized(0));
        assert!(!registry.mark_initialized(0));
        registry.mark_initialized(1);
        assert!(registry.all_initialized());
    }
}

//! Player discovery

use super::{Backend, MediaPlayer};

/// The place players live in (a page, a compositor, a simulator)
///
/// The environment reports which backend it provides; the synchronizer
/// reads that once at registration and never re-checks it.
pub trait MediaEnvironment {
    fn backend(&self) -> Backend;

    /// Resolve an identifier to a player, `None` if no such element exists
    fn resolve(&self, id: &str) -> Option<Box<dyn MediaPlayer>>;

    /// Element ids carrying the given group tag, in document order
    ///
    /// With the wrapped backend these are the library's inner element ids.
    fn group_members(&self, tag: &str) -> Vec<String>;
}

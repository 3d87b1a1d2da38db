//! Synchronization core and its session driver

pub mod buffer;
pub mod registry;
pub mod session;
pub mod synchronizer;

pub use buffer::{BufferCheckState, BufferOutcome};
pub use registry::{Readiness, Registry, Selection};
pub use session::{EventSink, SessionInbox, SessionInput};
pub use synchronizer::{Phase, Synchronizer};

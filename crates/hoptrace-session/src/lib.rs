//! Traceroute sessions: one live process, one incrementally built topology.

pub mod local;
pub mod notify;
pub mod registry;
pub mod session;
pub mod state;

pub use local::discover_source;
pub use notify::Notification;
pub use registry::{SessionId, SessionRegistry};
pub use session::{Session, SessionError};
pub use state::{SessionEvent, SessionState};

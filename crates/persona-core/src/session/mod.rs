//! Conversation sessions.
//!
//! [`SessionRegistry`] is a cheap, cloneable handle onto a single actor task
//! that owns every [`Session`]. Request handlers and the periodic expiry
//! sweeper both go through the same command queue, so the session map has
//! exactly one writer.

mod id;
mod registry;
mod types;

pub use registry::{RegistryConfig, RegistryError, SessionRegistry};
pub use types::{Role, Session, SessionConfig, SessionStats, SessionSummary, Turn};

//! Edit widgets: per-element session state and the registry that owns it.
//!
//! Elements are referred to only by [`ElementId`]. The registry maps each id
//! to its configuration and session, so event handlers never hold session
//! data themselves.

mod registry;
mod session;
mod state;

pub use registry::{Activation, Commit, Dispatch, PendingSave, SaveTicket, WidgetRegistry};
pub use session::{EditSession, SaveResolution};
pub use state::EditState;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a bound element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new random element id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an id previously produced by `to_string`.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of one session. Rebinding an element creates a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

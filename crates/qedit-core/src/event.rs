//! Control input events and widget lifecycle notifications.

use crate::error::EditError;
use crate::value::Value;
use crate::widget::ElementId;
use serde::{Deserialize, Serialize};

/// Keys the edit control reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl or Cmd held.
    pub fn action(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// An event raised by a mounted control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlEvent {
    KeyDown { key: Key, modifiers: Modifiers },
    Blur,
}

impl ControlEvent {
    pub fn key(key: Key) -> Self {
        Self::KeyDown {
            key,
            modifiers: Modifiers::default(),
        }
    }
}

/// Why a control was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    /// The value was saved.
    Saved,
    /// The user cancelled.
    Cancelled,
    /// Another widget opened in single-open mode.
    Replaced,
    /// The element was unbound or rebound.
    Unbound,
}

/// Lifecycle notifications queued by the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Shown { element: ElementId },
    Hidden { element: ElementId, reason: HideReason },
    SaveStarted { element: ElementId, value: Value },
    Saved { element: ElementId, value: Value },
    Rejected { element: ElementId, error: EditError },
    /// A save finished after its session was closed or replaced.
    StaleSave { element: ElementId },
}

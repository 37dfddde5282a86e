//! Renderer abstraction for edit controls.
//!
//! A renderer owns everything that touches the page: it builds the transient
//! control in place of an element's display, reads it back and tears it down.
//! The in-memory implementation backs tests and headless use; the browser
//! implementation lives in the web crate.

mod memory;

pub use memory::{DisplayState, MemoryRenderer, MountedControl, MountedKind};

use crate::config::WidgetConfig;
use crate::error::RenderError;
use crate::kind::ControlKind;
use crate::widget::ElementId;

/// Opaque handle to a mounted control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlHandle(u64);

impl ControlHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What to mount.
#[derive(Debug, Clone, Copy)]
pub struct ControlSpec<'a> {
    pub kind: ControlKind<'a>,
    pub placeholder: &'a str,
}

impl<'a> ControlSpec<'a> {
    pub fn from_config(config: &'a WidgetConfig) -> Self {
        Self {
            kind: config.kind().control(),
            placeholder: config.placeholder(),
        }
    }
}

/// Builds and tears down edit controls.
///
/// Side effects stay inside the subtree of the element being edited.
pub trait InputRenderer {
    /// Replace the element's display with a focused control seeded with
    /// `seed`. Select controls pre-select the option whose value equals
    /// `seed`, or nothing if none does.
    fn mount(
        &mut self,
        element: ElementId,
        spec: &ControlSpec<'_>,
        seed: &str,
    ) -> Result<ControlHandle, RenderError>;

    /// Current text or selected value of a control.
    fn read_raw_value(&self, handle: ControlHandle) -> Option<String>;

    /// Remove a control and restore the display. Idempotent.
    fn unmount(&mut self, handle: ControlHandle);

    /// Set the element's display text. `empty` marks the empty-text fallback.
    fn show_display(&mut self, element: ElementId, text: &str, empty: bool);

    /// Show or clear the error indicator next to a control.
    fn show_error(&mut self, handle: ControlHandle, message: Option<&str>);

    /// Forget any per-element state. Called when an element is unbound.
    fn release(&mut self, _element: ElementId) {}
}

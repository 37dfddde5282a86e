//! Edit state definitions.

/// The edit phase of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Showing the display text.
    Idle,
    /// A control is mounted and accepting input.
    Editing,
    /// A committed value is waiting on the save callback.
    Saving,
}

impl Default for EditState {
    fn default() -> Self {
        Self::Idle
    }
}

impl EditState {
    /// Check if a control is mounted (editing or saving).
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Editing | Self::Saving)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving)
    }
}

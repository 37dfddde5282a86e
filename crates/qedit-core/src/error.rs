//! Recoverable edit errors.

use thiserror::Error;

/// Errors raised while committing an edit.
///
/// All of them leave the session in `Editing` with the control still open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The control text does not fit the input kind.
    #[error("{0}")]
    Parse(String),
    /// A validator rejected the value.
    #[error("{0}")]
    Validation(String),
    /// The save callback reported failure.
    #[error("{0}")]
    Save(String),
}

impl EditError {
    /// The user-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Parse(msg) | Self::Validation(msg) | Self::Save(msg) => msg,
        }
    }
}

/// Errors raised by a renderer while building a control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Element not registered with renderer: {0}")]
    UnknownElement(String),
    #[error("DOM error: {0}")]
    Dom(String),
}

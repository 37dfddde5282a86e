//! qedit Core Library
//!
//! Platform-agnostic click-to-edit widgets: value formatting per input kind,
//! the per-element edit session state machine, and the registry that binds
//! sessions to elements and routes their events.

pub mod config;
pub mod date_format;
pub mod error;
pub mod event;
pub mod format;
pub mod kind;
pub mod render;
pub mod value;
pub mod widget;

pub use config::{
    BlurAction, ConfigError, InputType, RegistryConfig, SaveCallback, SaveFuture, SavingConflict,
    Validator, WidgetConfig, WidgetOptions,
};
pub use date_format::DateFormat;
pub use error::{EditError, RenderError};
pub use event::{ControlEvent, HideReason, Key, Modifiers, WidgetEvent};
pub use kind::{ControlKind, InputKind, SelectOption};
pub use render::{ControlHandle, ControlSpec, InputRenderer, MemoryRenderer};
pub use value::{CalendarDate, Value};
pub use widget::{
    Activation, Commit, Dispatch, EditSession, EditState, ElementId, PendingSave, SaveResolution,
    SaveTicket, SessionId, WidgetRegistry,
};

//! Per-element edit session state machine.

use super::{EditState, ElementId, SessionId};
use crate::config::{SaveFuture, WidgetConfig};
use crate::error::{EditError, RenderError};
use crate::format;
use crate::render::{ControlHandle, ControlSpec, InputRenderer};
use crate::value::Value;

#[derive(Debug)]
enum Phase {
    Idle,
    Editing {
        control: ControlHandle,
        /// Control text as of the last read.
        pending: String,
    },
    Saving {
        control: ControlHandle,
        pending: String,
        value: Value,
        sequence: u64,
    },
}

/// Result of a commit attempt on a session.
pub(crate) enum SessionCommit {
    NotEditing,
    Rejected(EditError),
    Saving {
        sequence: u64,
        value: Value,
        future: SaveFuture,
    },
}

/// How a save result was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveResolution {
    /// The value was committed and the control closed.
    Saved(Value),
    /// The callback failed; the control stays open.
    Failed(EditError),
    /// The session that started the save is gone or no longer waiting on it.
    Stale,
}

/// Edit lifecycle of one bound element: Idle → Editing → Saving → Idle.
#[derive(Debug)]
pub struct EditSession {
    id: SessionId,
    phase: Phase,
    original_value: Value,
    last_error: Option<EditError>,
    next_sequence: u64,
}

impl EditSession {
    /// Create an idle session holding a committed value.
    pub fn new(value: Value) -> Self {
        Self {
            id: SessionId::new(),
            phase: Phase::Idle,
            original_value: value,
            last_error: None,
            next_sequence: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> EditState {
        match self.phase {
            Phase::Idle => EditState::Idle,
            Phase::Editing { .. } => EditState::Editing,
            Phase::Saving { .. } => EditState::Saving,
        }
    }

    /// The last committed value.
    pub fn original_value(&self) -> &Value {
        &self.original_value
    }

    /// Control text while editing or saving.
    pub fn pending_value(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Editing { pending, .. } | Phase::Saving { pending, .. } => Some(pending),
        }
    }

    /// The mounted control, if any.
    pub fn control(&self) -> Option<ControlHandle> {
        match self.phase {
            Phase::Idle => None,
            Phase::Editing { control, .. } | Phase::Saving { control, .. } => Some(control),
        }
    }

    pub fn last_error(&self) -> Option<&EditError> {
        self.last_error.as_ref()
    }

    /// Open a control seeded with the committed value.
    ///
    /// Returns `Ok(None)` if a control is already open.
    pub fn activate<R: InputRenderer>(
        &mut self,
        element: ElementId,
        config: &WidgetConfig,
        renderer: &mut R,
    ) -> Result<Option<ControlHandle>, RenderError> {
        if !matches!(self.phase, Phase::Idle) {
            return Ok(None);
        }

        let seed = format::to_edit_text(&self.original_value, config);
        let control = renderer.mount(element, &ControlSpec::from_config(config), &seed)?;
        self.last_error = None;
        self.phase = Phase::Editing {
            control,
            pending: seed,
        };
        Ok(Some(control))
    }

    /// Discard the pending edit. Only applies while editing.
    pub fn cancel<R: InputRenderer>(
        &mut self,
        element: ElementId,
        config: &WidgetConfig,
        renderer: &mut R,
    ) -> Option<ControlHandle> {
        match self.phase {
            Phase::Editing { .. } => self.close(element, config, renderer),
            _ => None,
        }
    }

    /// Close any open control, dropping an outstanding save.
    pub fn close<R: InputRenderer>(
        &mut self,
        element: ElementId,
        config: &WidgetConfig,
        renderer: &mut R,
    ) -> Option<ControlHandle> {
        let control = self.control()?;
        self.phase = Phase::Idle;
        renderer.unmount(control);
        self.refresh_display(element, config, renderer);
        Some(control)
    }

    /// Read, parse and validate the control, then start the save.
    pub(crate) fn commit<R: InputRenderer>(
        &mut self,
        config: &WidgetConfig,
        renderer: &mut R,
    ) -> SessionCommit {
        let Phase::Editing { control, pending } = &mut self.phase else {
            return SessionCommit::NotEditing;
        };
        let control = *control;
        if let Some(raw) = renderer.read_raw_value(control) {
            *pending = raw;
        }
        let raw = pending.clone();

        let value = match format::parse_edit(&raw, config) {
            Ok(value) => value,
            Err(error) => return self.reject(control, error, renderer),
        };
        if let Some(message) = config.validate(&value) {
            return self.reject(control, EditError::Validation(message), renderer);
        }

        if self.last_error.take().is_some() {
            renderer.show_error(control, None);
        }
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        let future = (config.save)(&value);
        self.phase = Phase::Saving {
            control,
            pending: raw,
            value: value.clone(),
            sequence,
        };
        SessionCommit::Saving {
            sequence,
            value,
            future,
        }
    }

    /// Apply the outcome of the save numbered `sequence`.
    pub(crate) fn resolve_save<R: InputRenderer>(
        &mut self,
        element: ElementId,
        sequence: u64,
        result: Result<(), String>,
        config: &WidgetConfig,
        renderer: &mut R,
    ) -> SaveResolution {
        match &self.phase {
            Phase::Saving { sequence: current, .. } if *current == sequence => {}
            _ => return SaveResolution::Stale,
        }
        let Phase::Saving {
            control,
            pending,
            value,
            ..
        } = std::mem::replace(&mut self.phase, Phase::Idle)
        else {
            return SaveResolution::Stale;
        };

        match result {
            Ok(()) => {
                self.original_value = value.clone();
                self.last_error = None;
                renderer.unmount(control);
                self.refresh_display(element, config, renderer);
                SaveResolution::Saved(value)
            }
            Err(message) => {
                self.phase = Phase::Editing { control, pending };
                let error = EditError::Save(message);
                renderer.show_error(control, Some(error.message()));
                self.last_error = Some(error.clone());
                SaveResolution::Failed(error)
            }
        }
    }

    /// Replace the committed value without a save. Only applies while idle.
    pub fn set_value<R: InputRenderer>(
        &mut self,
        value: Value,
        element: ElementId,
        config: &WidgetConfig,
        renderer: &mut R,
    ) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            return false;
        }
        self.original_value = value;
        self.refresh_display(element, config, renderer);
        true
    }

    /// Render the committed value into the element's display.
    pub fn refresh_display<R: InputRenderer>(
        &self,
        element: ElementId,
        config: &WidgetConfig,
        renderer: &mut R,
    ) {
        renderer.show_display(
            element,
            &format::to_display(&self.original_value, config),
            format::is_empty_display(&self.original_value, config),
        );
    }

    fn reject<R: InputRenderer>(
        &mut self,
        control: ControlHandle,
        error: EditError,
        renderer: &mut R,
    ) -> SessionCommit {
        renderer.show_error(control, Some(error.message()));
        self.last_error = Some(error.clone());
        SessionCommit::Rejected(error)
    }
}

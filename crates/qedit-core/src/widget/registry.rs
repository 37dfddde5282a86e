//! Widget registry binding sessions to elements.

use std::collections::HashMap;

use super::session::SessionCommit;
use super::{EditSession, EditState, ElementId, SaveResolution, SessionId};
use crate::config::{BlurAction, RegistryConfig, SaveFuture, SavingConflict, WidgetConfig};
use crate::error::{EditError, RenderError};
use crate::event::{ControlEvent, HideReason, Key, WidgetEvent};
use crate::render::{ControlHandle, InputRenderer};
use crate::value::Value;

/// Identifies one outstanding save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    pub element: ElementId,
    pub session: SessionId,
    pub sequence: u64,
}

/// A save the host must drive to completion and report with
/// [`WidgetRegistry::finish_save`].
pub struct PendingSave {
    ticket: SaveTicket,
    value: Value,
    future: SaveFuture,
}

impl PendingSave {
    pub fn ticket(&self) -> SaveTicket {
        self.ticket
    }

    /// The value handed to the save callback.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Wait for the save callback.
    pub async fn wait(self) -> (SaveTicket, Result<(), String>) {
        let result = self.future.await;
        (self.ticket, result)
    }
}

impl std::fmt::Debug for PendingSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSave")
            .field("ticket", &self.ticket)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Outcome of an activation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Opened(ControlHandle),
    /// The element is already editing or saving.
    AlreadyOpen,
    /// Single-open mode and another element is saving.
    Blocked { by: ElementId },
    Unbound,
    Failed(RenderError),
}

/// Outcome of a commit request.
#[derive(Debug)]
pub enum Commit {
    /// Nothing to commit (not editing, or not bound).
    Ignored,
    Rejected(EditError),
    Saving(PendingSave),
}

/// Result of routing a control event.
#[derive(Debug)]
pub enum Dispatch {
    Ignored,
    Cancelled,
    Commit(Commit),
}

struct WidgetEntry {
    config: WidgetConfig,
    session: EditSession,
}

/// Owns every bound element's configuration and session.
pub struct WidgetRegistry<R: InputRenderer> {
    renderer: R,
    config: RegistryConfig,
    entries: HashMap<ElementId, WidgetEntry>,
    /// Mounted control → owning element.
    controls: HashMap<ControlHandle, ElementId>,
    events: Vec<WidgetEvent>,
}

impl<R: InputRenderer> WidgetRegistry<R> {
    /// Create a registry with default settings.
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, RegistryConfig::default())
    }

    pub fn with_config(renderer: R, config: RegistryConfig) -> Self {
        Self {
            renderer,
            config,
            entries: HashMap::new(),
            controls: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Bind an element. Rebinding keeps the committed value but discards
    /// any edit in progress.
    pub fn bind(&mut self, element: ElementId, config: WidgetConfig) {
        let value = self
            .entries
            .get(&element)
            .map(|entry| entry.session.original_value().clone())
            .unwrap_or_default();
        self.bind_with_value(element, config, value);
    }

    /// Bind an element with an initial committed value.
    pub fn bind_with_value(&mut self, element: ElementId, config: WidgetConfig, value: Value) {
        if self.entries.contains_key(&element) {
            log::debug!("Rebinding {}", element);
            self.close(element, HideReason::Unbound);
        }

        let session = EditSession::new(value);
        session.refresh_display(element, &config, &mut self.renderer);
        self.entries.insert(element, WidgetEntry { config, session });
    }

    /// Unbind an element, closing any open control. Returns false if the
    /// element was not bound.
    pub fn unbind(&mut self, element: ElementId) -> bool {
        if !self.entries.contains_key(&element) {
            return false;
        }
        self.close(element, HideReason::Unbound);
        self.entries.remove(&element);
        self.renderer.release(element);
        log::debug!("Unbound {}", element);
        true
    }

    /// Open the element's control.
    ///
    /// In single-open mode any other editing element is cancelled first.
    pub fn activate(&mut self, element: ElementId) -> Activation {
        let Some(entry) = self.entries.get(&element) else {
            return Activation::Unbound;
        };
        if entry.session.state().is_open() {
            return Activation::AlreadyOpen;
        }

        if self.single_open_applies(element) {
            let others: Vec<(ElementId, EditState)> = self
                .entries
                .iter()
                .filter(|(id, other)| **id != element && other.session.state().is_open())
                .map(|(id, other)| (*id, other.session.state()))
                .collect();

            if self.config.saving_conflict == SavingConflict::Refuse {
                if let Some((by, _)) = others.iter().find(|(_, state)| state.is_saving()) {
                    log::warn!("Activation of {} refused: {} is saving", element, by);
                    return Activation::Blocked { by: *by };
                }
            }
            for (other, _) in others {
                self.close(other, HideReason::Replaced);
            }
        }

        let Some(entry) = self.entries.get_mut(&element) else {
            return Activation::Unbound;
        };
        match entry
            .session
            .activate(element, &entry.config, &mut self.renderer)
        {
            Ok(Some(control)) => {
                self.controls.insert(control, element);
                self.events.push(WidgetEvent::Shown { element });
                log::debug!("Editing {}", element);
                Activation::Opened(control)
            }
            Ok(None) => Activation::AlreadyOpen,
            Err(error) => {
                log::warn!("Failed to open control for {}: {}", element, error);
                Activation::Failed(error)
            }
        }
    }

    /// Discard the element's pending edit. Returns false if it was not editing.
    pub fn cancel(&mut self, element: ElementId) -> bool {
        let Some(entry) = self.entries.get_mut(&element) else {
            return false;
        };
        match entry
            .session
            .cancel(element, &entry.config, &mut self.renderer)
        {
            Some(control) => {
                self.controls.remove(&control);
                self.events.push(WidgetEvent::Hidden {
                    element,
                    reason: HideReason::Cancelled,
                });
                log::debug!("Cancelled {}", element);
                true
            }
            None => false,
        }
    }

    /// Commit the element's control.
    ///
    /// A returned [`PendingSave`] must be awaited and passed back to
    /// [`finish_save`](Self::finish_save).
    pub fn commit(&mut self, element: ElementId) -> Commit {
        let Some(entry) = self.entries.get_mut(&element) else {
            return Commit::Ignored;
        };
        let session_id = entry.session.id();
        match entry.session.commit(&entry.config, &mut self.renderer) {
            SessionCommit::NotEditing => Commit::Ignored,
            SessionCommit::Rejected(error) => {
                log::debug!("Commit of {} rejected: {}", element, error);
                self.events.push(WidgetEvent::Rejected {
                    element,
                    error: error.clone(),
                });
                Commit::Rejected(error)
            }
            SessionCommit::Saving {
                sequence,
                value,
                future,
            } => {
                log::info!("Saving {}", element);
                self.events.push(WidgetEvent::SaveStarted {
                    element,
                    value: value.clone(),
                });
                Commit::Saving(PendingSave {
                    ticket: SaveTicket {
                        element,
                        session: session_id,
                        sequence,
                    },
                    value,
                    future,
                })
            }
        }
    }

    /// Apply the result of a save started by [`commit`](Self::commit).
    ///
    /// Results for sessions that were unbound, rebound or closed are dropped.
    pub fn finish_save(&mut self, ticket: SaveTicket, result: Result<(), String>) -> SaveResolution {
        let element = ticket.element;
        let resolution = match self.entries.get_mut(&element) {
            Some(entry) if entry.session.id() == ticket.session => {
                let control = entry.session.control();
                let resolution = entry.session.resolve_save(
                    element,
                    ticket.sequence,
                    result,
                    &entry.config,
                    &mut self.renderer,
                );
                if let (SaveResolution::Saved(_), Some(control)) = (&resolution, control) {
                    self.controls.remove(&control);
                }
                resolution
            }
            _ => SaveResolution::Stale,
        };

        match &resolution {
            SaveResolution::Saved(value) => {
                log::info!("Saved {}", element);
                self.events.push(WidgetEvent::Saved {
                    element,
                    value: value.clone(),
                });
                self.events.push(WidgetEvent::Hidden {
                    element,
                    reason: HideReason::Saved,
                });
            }
            SaveResolution::Failed(error) => {
                log::warn!("Save of {} failed: {}", element, error);
                self.events.push(WidgetEvent::Rejected {
                    element,
                    error: error.clone(),
                });
            }
            SaveResolution::Stale => {
                log::debug!("Dropping stale save result for {}", element);
                self.events.push(WidgetEvent::StaleSave { element });
            }
        }
        resolution
    }

    /// Activation trigger on an element's display.
    pub fn on_click(&mut self, element: ElementId) -> Activation {
        self.activate(element)
    }

    /// Route an event from a mounted control to its owning session.
    pub fn on_control_event(&mut self, control: ControlHandle, event: ControlEvent) -> Dispatch {
        let Some(&element) = self.controls.get(&control) else {
            return Dispatch::Ignored;
        };
        let Some(entry) = self.entries.get(&element) else {
            return Dispatch::Ignored;
        };

        match event {
            ControlEvent::KeyDown {
                key: Key::Enter,
                modifiers,
            } => {
                if entry.config.kind().is_multiline() && !modifiers.action() {
                    Dispatch::Ignored
                } else {
                    Dispatch::Commit(self.commit(element))
                }
            }
            ControlEvent::KeyDown {
                key: Key::Escape, ..
            } => {
                if self.cancel(element) {
                    Dispatch::Cancelled
                } else {
                    Dispatch::Ignored
                }
            }
            ControlEvent::KeyDown { .. } => Dispatch::Ignored,
            ControlEvent::Blur => match entry.config.blur() {
                BlurAction::Commit => Dispatch::Commit(self.commit(element)),
                BlurAction::Cancel if self.cancel(element) => Dispatch::Cancelled,
                BlurAction::Cancel | BlurAction::Ignore => Dispatch::Ignored,
            },
        }
    }

    /// Replace an idle element's committed value and refresh its display.
    pub fn set_value(&mut self, element: ElementId, value: Value) -> bool {
        let Some(entry) = self.entries.get_mut(&element) else {
            return false;
        };
        entry
            .session
            .set_value(value, element, &entry.config, &mut self.renderer)
    }

    pub fn value(&self, element: ElementId) -> Option<&Value> {
        self.entries
            .get(&element)
            .map(|entry| entry.session.original_value())
    }

    pub fn state(&self, element: ElementId) -> Option<EditState> {
        self.entries.get(&element).map(|entry| entry.session.state())
    }

    pub fn last_error(&self, element: ElementId) -> Option<&EditError> {
        self.entries
            .get(&element)
            .and_then(|entry| entry.session.last_error())
    }

    pub fn session(&self, element: ElementId) -> Option<&EditSession> {
        self.entries.get(&element).map(|entry| &entry.session)
    }

    pub fn widget_config(&self, element: ElementId) -> Option<&WidgetConfig> {
        self.entries.get(&element).map(|entry| &entry.config)
    }

    /// Element owning a mounted control.
    pub fn element_for(&self, control: ControlHandle) -> Option<ElementId> {
        self.controls.get(&control).copied()
    }

    /// Elements currently editing or saving.
    pub fn open_elements(&self) -> Vec<ElementId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.session.state().is_open())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_bound(&self, element: ElementId) -> bool {
        self.entries.contains_key(&element)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take queued lifecycle events.
    pub fn drain_events(&mut self) -> Vec<WidgetEvent> {
        std::mem::take(&mut self.events)
    }

    /// Single-open applies if the activating element asks for it or an open
    /// element does.
    fn single_open_applies(&self, element: ElementId) -> bool {
        self.entries.iter().any(|(id, entry)| {
            entry.config.single_open() && (*id == element || entry.session.state().is_open())
        })
    }

    /// Close an element's control whatever its state.
    fn close(&mut self, element: ElementId, reason: HideReason) {
        let Some(entry) = self.entries.get_mut(&element) else {
            return;
        };
        if let Some(control) = entry
            .session
            .close(element, &entry.config, &mut self.renderer)
        {
            self.controls.remove(&control);
            self.events.push(WidgetEvent::Hidden { element, reason });
            log::debug!("Closed {} ({:?})", element, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_format::DateFormat;
    use crate::event::Modifiers;
    use crate::kind::{InputKind, SelectOption};
    use crate::render::MemoryRenderer;
    use crate::value::CalendarDate;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn registry() -> WidgetRegistry<MemoryRenderer> {
        WidgetRegistry::new(MemoryRenderer::new())
    }

    fn text_config() -> WidgetConfig {
        WidgetConfig::new(InputKind::Text).unwrap()
    }

    fn opened(activation: Activation) -> ControlHandle {
        match activation {
            Activation::Opened(control) => control,
            other => panic!("expected control, got {:?}", other),
        }
    }

    fn pending(commit: Commit) -> PendingSave {
        match commit {
            Commit::Saving(save) => save,
            other => panic!("expected save, got {:?}", other),
        }
    }

    fn drive(registry: &mut WidgetRegistry<MemoryRenderer>, save: PendingSave) -> SaveResolution {
        let (ticket, result) = pollster::block_on(save.wait());
        registry.finish_save(ticket, result)
    }

    /// Records every value passed to the save callback.
    fn recording(config: WidgetConfig) -> (WidgetConfig, Rc<RefCell<Vec<Value>>>) {
        let saved = Rc::new(RefCell::new(Vec::new()));
        let sink = saved.clone();
        let config = config.with_save(move |value| {
            sink.borrow_mut().push(value.clone());
            async { Ok(()) }
        });
        (config, saved)
    }

    #[test]
    fn test_bind_then_unbind_leaves_nothing() {
        let mut registry = registry();
        let element = ElementId::new();

        registry.bind(element, text_config());
        assert!(registry.is_bound(element));
        assert!(registry.unbind(element));

        assert!(registry.is_empty());
        assert_eq!(registry.renderer().mounted(), 0);
        assert!(!registry.unbind(element));
    }

    #[test]
    fn test_unbind_while_editing_unmounts() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind(element, text_config());
        opened(registry.activate(element));

        registry.unbind(element);
        assert_eq!(registry.renderer().mounted(), 0);
        assert!(registry.open_elements().is_empty());
    }

    #[test]
    fn test_activate_twice() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind(element, text_config());

        opened(registry.activate(element));
        assert_eq!(registry.activate(element), Activation::AlreadyOpen);
        assert_eq!(registry.renderer().mounted(), 1);
        assert_eq!(registry.state(element), Some(EditState::Editing));
        assert_eq!(registry.activate(ElementId::new()), Activation::Unbound);
    }

    #[test]
    fn test_escape_cancels() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind_with_value(element, text_config(), Value::text("keep"));

        let control = opened(registry.on_click(element));
        registry.renderer_mut().type_text(control, "discard");
        let dispatch = registry.on_control_event(control, ControlEvent::key(Key::Escape));

        assert!(matches!(dispatch, Dispatch::Cancelled));
        assert_eq!(registry.state(element), Some(EditState::Idle));
        assert_eq!(registry.value(element), Some(&Value::text("keep")));
        assert_eq!(registry.renderer().display(element).unwrap().text, "keep");
        assert_eq!(registry.element_for(control), None);
    }

    #[test]
    fn test_enter_commits_and_saves_once() {
        let mut registry = registry();
        let element = ElementId::new();
        let (config, saved) = recording(text_config());
        registry.bind(element, config);

        let control = opened(registry.activate(element));
        registry.renderer_mut().type_text(control, "hello");
        let Dispatch::Commit(commit) = registry.on_control_event(control, ControlEvent::key(Key::Enter))
        else {
            panic!("expected commit");
        };
        let save = pending(commit);
        assert_eq!(registry.state(element), Some(EditState::Saving));

        // Blur fired while saving does nothing.
        let blur = registry.on_control_event(control, ControlEvent::Blur);
        assert!(matches!(blur, Dispatch::Commit(Commit::Ignored)));

        assert_eq!(drive(&mut registry, save), SaveResolution::Saved(Value::text("hello")));
        assert_eq!(saved.borrow().as_slice(), &[Value::text("hello")]);
        assert_eq!(registry.state(element), Some(EditState::Idle));
        assert_eq!(registry.renderer().display(element).unwrap().text, "hello");
        assert_eq!(registry.renderer().mounted(), 0);
    }

    #[test]
    fn test_save_failure_keeps_control_open() {
        let mut registry = registry();
        let element = ElementId::new();
        let config = text_config().with_save(|_| async { Err("Server said no".to_string()) });
        registry.bind_with_value(element, config, Value::text("old"));

        let control = opened(registry.activate(element));
        registry.renderer_mut().type_text(control, "new");
        let save = pending(registry.commit(element));

        let resolution = drive(&mut registry, save);
        assert_eq!(resolution, SaveResolution::Failed(EditError::Save("Server said no".to_string())));
        assert_eq!(registry.state(element), Some(EditState::Editing));
        assert_eq!(registry.value(element), Some(&Value::text("old")));
        assert_eq!(registry.last_error(element).map(EditError::message), Some("Server said no"));
        assert_eq!(registry.renderer().read_raw_value(control).as_deref(), Some("new"));
        assert_eq!(registry.element_for(control), Some(element));
    }

    #[test]
    fn test_valid_commit_clears_previous_error() {
        let mut registry = registry();
        let element = ElementId::new();
        let kind = InputKind::Date {
            format: DateFormat::default(),
        };
        registry.bind(element, WidgetConfig::new(kind).unwrap());

        let control = opened(registry.activate(element));
        registry.renderer_mut().type_text(control, "2024-02-30");
        assert!(matches!(registry.commit(element), Commit::Rejected(EditError::Parse(_))));
        assert!(registry.last_error(element).is_some());
        assert!(registry.renderer().control(control).unwrap().error.is_some());

        registry.renderer_mut().type_text(control, "2024-02-20");
        let save = pending(registry.commit(element));
        assert_eq!(registry.state(element), Some(EditState::Saving));
        assert!(registry.last_error(element).is_none());
        assert_eq!(registry.renderer().control(control).unwrap().error, None);

        drive(&mut registry, save);
        assert!(registry.last_error(element).is_none());
    }

    #[test]
    fn test_textarea_enter_needs_modifier() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind(element, WidgetConfig::new(InputKind::Textarea).unwrap());
        let control = opened(registry.activate(element));

        let plain = registry.on_control_event(control, ControlEvent::key(Key::Enter));
        assert!(matches!(plain, Dispatch::Ignored));
        assert_eq!(registry.state(element), Some(EditState::Editing));

        let with_ctrl = registry.on_control_event(
            control,
            ControlEvent::KeyDown {
                key: Key::Enter,
                modifiers: Modifiers {
                    ctrl: true,
                    ..Default::default()
                },
            },
        );
        assert!(matches!(with_ctrl, Dispatch::Commit(Commit::Saving(_))));
    }

    #[test]
    fn test_blur_policies() {
        let mut registry = registry();
        let cancel = ElementId::new();
        let ignore = ElementId::new();
        registry.bind(cancel, text_config().with_blur(BlurAction::Cancel));
        registry.bind(ignore, text_config().with_blur(BlurAction::Ignore));

        let control = opened(registry.activate(cancel));
        assert!(matches!(
            registry.on_control_event(control, ControlEvent::Blur),
            Dispatch::Cancelled
        ));

        let control = opened(registry.activate(ignore));
        assert!(matches!(
            registry.on_control_event(control, ControlEvent::Blur),
            Dispatch::Ignored
        ));
        assert_eq!(registry.state(ignore), Some(EditState::Editing));
    }

    #[test]
    fn test_single_open_cancels_other() {
        let mut registry = registry();
        let a = ElementId::new();
        let b = ElementId::new();
        registry.bind_with_value(a, text_config().with_single_open(true), Value::text("a"));
        registry.bind(b, text_config().with_single_open(true));

        let control_a = opened(registry.activate(a));
        registry.renderer_mut().type_text(control_a, "unsaved");
        registry.drain_events();

        opened(registry.activate(b));
        assert_eq!(registry.state(a), Some(EditState::Idle));
        assert_eq!(registry.value(a), Some(&Value::text("a")));
        assert_eq!(registry.open_elements(), vec![b]);
        assert_eq!(registry.renderer().mounted(), 1);
        assert_eq!(
            registry.drain_events(),
            vec![
                WidgetEvent::Hidden {
                    element: a,
                    reason: HideReason::Replaced
                },
                WidgetEvent::Shown { element: b },
            ]
        );
    }

    #[test]
    fn test_without_single_open_both_stay_open() {
        let mut registry = registry();
        let a = ElementId::new();
        let b = ElementId::new();
        registry.bind(a, text_config());
        registry.bind(b, text_config());

        opened(registry.activate(a));
        opened(registry.activate(b));
        assert_eq!(registry.open_elements().len(), 2);
    }

    #[test]
    fn test_single_open_refuses_while_saving() {
        let mut registry = registry();
        let a = ElementId::new();
        let b = ElementId::new();
        registry.bind(a, text_config().with_single_open(true));
        registry.bind(b, text_config().with_single_open(true));

        opened(registry.activate(a));
        let save = pending(registry.commit(a));

        assert_eq!(registry.activate(b), Activation::Blocked { by: a });
        assert_eq!(registry.state(a), Some(EditState::Saving));
        assert_eq!(registry.state(b), Some(EditState::Idle));

        assert!(matches!(drive(&mut registry, save), SaveResolution::Saved(_)));
        opened(registry.activate(b));
    }

    #[test]
    fn test_deferred_save_result_still_resolves() {
        let mut registry = registry();
        let a = ElementId::new();
        let b = ElementId::new();
        registry.bind(a, text_config().with_single_open(true));
        registry.bind(b, text_config().with_single_open(true));

        let control = opened(registry.activate(a));
        let save = pending(registry.commit(a));
        let (ticket, result) = pollster::block_on(save.wait());

        // Other traffic arrives before the result is applied.
        assert_eq!(registry.on_click(b), Activation::Blocked { by: a });
        registry.on_control_event(control, ControlEvent::Blur);
        registry.on_control_event(control, ControlEvent::key(Key::Escape));
        assert_eq!(registry.state(a), Some(EditState::Saving));

        assert!(matches!(registry.finish_save(ticket, result), SaveResolution::Saved(_)));
        assert_eq!(registry.state(a), Some(EditState::Idle));
        opened(registry.on_click(b));
    }

    #[test]
    fn test_single_open_force_cancel_drops_save() {
        let config = RegistryConfig {
            saving_conflict: SavingConflict::ForceCancel,
        };
        let mut registry = WidgetRegistry::with_config(MemoryRenderer::new(), config);
        let a = ElementId::new();
        let b = ElementId::new();
        registry.bind(a, text_config().with_single_open(true));
        registry.bind(b, text_config().with_single_open(true));

        let control = opened(registry.activate(a));
        registry.renderer_mut().type_text(control, "late");
        let save = pending(registry.commit(a));

        opened(registry.activate(b));
        assert_eq!(registry.state(a), Some(EditState::Idle));
        assert_eq!(drive(&mut registry, save), SaveResolution::Stale);
        assert_eq!(registry.value(a), Some(&Value::Empty));
    }

    #[test]
    fn test_rebind_while_saving_drops_result() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind_with_value(element, text_config(), Value::text("first"));

        let control = opened(registry.activate(element));
        registry.renderer_mut().type_text(control, "second");
        let save = pending(registry.commit(element));

        registry.bind(element, text_config());
        assert_eq!(registry.state(element), Some(EditState::Idle));
        assert_eq!(registry.renderer().mounted(), 0);

        // New session reaches Saving with the same sequence number.
        let control = opened(registry.activate(element));
        registry.renderer_mut().type_text(control, "third");
        let fresh = pending(registry.commit(element));
        assert_eq!(fresh.ticket().sequence, save.ticket().sequence);

        assert_eq!(drive(&mut registry, save), SaveResolution::Stale);
        assert_eq!(registry.state(element), Some(EditState::Saving));
        assert_eq!(registry.value(element), Some(&Value::text("first")));

        drive(&mut registry, fresh);
        assert_eq!(registry.value(element), Some(&Value::text("third")));
    }

    #[test]
    fn test_unbind_while_saving_drops_result() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind(element, text_config());
        opened(registry.activate(element));
        let save = pending(registry.commit(element));

        registry.unbind(element);
        assert_eq!(drive(&mut registry, save), SaveResolution::Stale);
        assert!(!registry.is_bound(element));
    }

    #[test]
    fn test_date_scenario() {
        let mut registry = registry();
        let element = ElementId::new();
        let kind = InputKind::Date {
            format: DateFormat::new("YYYY-MM-DD").unwrap(),
        };
        let (config, saved) = recording(WidgetConfig::new(kind).unwrap());
        let start = CalendarDate::new(2024, 1, 15).unwrap();
        registry.bind_with_value(element, config, Value::Date(start));
        assert_eq!(registry.renderer().display(element).unwrap().text, "2024-01-15");

        let control = opened(registry.activate(element));
        assert_eq!(registry.renderer().read_raw_value(control).as_deref(), Some("2024-01-15"));

        registry.renderer_mut().type_text(control, "2024-02-30");
        assert!(matches!(registry.commit(element), Commit::Rejected(EditError::Parse(_))));
        assert_eq!(registry.state(element), Some(EditState::Editing));
        assert!(saved.borrow().is_empty());

        registry.renderer_mut().type_text(control, "2024-02-20");
        let save = pending(registry.commit(element));
        let expected = Value::Date(CalendarDate::new(2024, 2, 20).unwrap());
        assert_eq!(save.value(), &expected);
        assert_eq!(drive(&mut registry, save), SaveResolution::Saved(expected.clone()));

        assert_eq!(saved.borrow().as_slice(), &[expected]);
        assert_eq!(registry.renderer().display(element).unwrap().text, "2024-02-20");
        assert_eq!(registry.state(element), Some(EditState::Idle));
        assert!(registry.last_error(element).is_none());
    }

    #[test]
    fn test_select_scenario() {
        let mut registry = registry();
        let element = ElementId::new();
        let kind = InputKind::Select {
            options: vec![SelectOption::new("a", "Alpha"), SelectOption::new("b", "Beta")],
        };
        let (config, saved) = recording(WidgetConfig::new(kind).unwrap());
        registry.bind_with_value(element, config, Value::text("b"));
        assert_eq!(registry.renderer().display(element).unwrap().text, "Beta");

        let control = opened(registry.activate(element));
        assert_eq!(registry.renderer().read_raw_value(control).as_deref(), Some("b"));

        let save = pending(registry.commit(element));
        drive(&mut registry, save);
        assert_eq!(saved.borrow().as_slice(), &[Value::text("b")]);
        assert_eq!(registry.renderer().display(element).unwrap().text, "Beta");
    }

    #[test]
    fn test_set_value_refreshes_display() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind(element, text_config().with_empty_text("--"));
        assert_eq!(registry.renderer().display(element).unwrap().text, "--");
        assert!(registry.renderer().display(element).unwrap().empty);

        assert!(registry.set_value(element, Value::text("set")));
        assert_eq!(registry.renderer().display(element).unwrap().text, "set");
        assert!(!registry.set_value(ElementId::new(), Value::Empty));
    }

    #[test]
    fn test_events_for_save_cycle() {
        let mut registry = registry();
        let element = ElementId::new();
        registry.bind(element, text_config());
        let control = opened(registry.activate(element));
        registry.renderer_mut().type_text(control, "v");
        let save = pending(registry.commit(element));
        drive(&mut registry, save);

        assert_eq!(
            registry.drain_events(),
            vec![
                WidgetEvent::Shown { element },
                WidgetEvent::SaveStarted {
                    element,
                    value: Value::text("v")
                },
                WidgetEvent::Saved {
                    element,
                    value: Value::text("v")
                },
                WidgetEvent::Hidden {
                    element,
                    reason: HideReason::Saved
                },
            ]
        );
        assert!(registry.drain_events().is_empty());
    }
}

//! In-memory renderer implementation.

use super::{ControlHandle, ControlSpec, InputRenderer};
use crate::error::RenderError;
use crate::kind::{ControlKind, SelectOption};
use crate::widget::ElementId;
use std::collections::HashMap;

/// Owned copy of the control kind that was mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountedKind {
    TextBox,
    TextArea,
    Select(Vec<SelectOption>),
    DatePicker(String),
}

/// A control held by the in-memory renderer.
#[derive(Debug, Clone)]
pub struct MountedControl {
    pub element: ElementId,
    pub kind: MountedKind,
    pub placeholder: String,
    /// Text content, or the selected option value (empty if none).
    pub text: String,
    pub error: Option<String>,
}

/// What an element currently shows in place of a control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub text: String,
    pub empty: bool,
    /// Hidden while a control is mounted.
    pub hidden: bool,
}

/// Records controls and displays without a real page.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    next_handle: u64,
    controls: HashMap<ControlHandle, MountedControl>,
    displays: HashMap<ElementId, DisplayState>,
    focused: Option<ControlHandle>,
    mount_count: usize,
}

impl MemoryRenderer {
    /// Create a new empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a mounted control.
    pub fn control(&self, handle: ControlHandle) -> Option<&MountedControl> {
        self.controls.get(&handle)
    }

    /// Get the control mounted for an element, if any.
    pub fn control_for(&self, element: ElementId) -> Option<(ControlHandle, &MountedControl)> {
        self.controls
            .iter()
            .find(|(_, control)| control.element == element)
            .map(|(handle, control)| (*handle, control))
    }

    /// Number of controls currently mounted.
    pub fn mounted(&self) -> usize {
        self.controls.len()
    }

    /// Number of mounts performed since creation.
    pub fn mount_count(&self) -> usize {
        self.mount_count
    }

    /// The control holding focus.
    pub fn focused(&self) -> Option<ControlHandle> {
        self.focused
    }

    /// Get an element's display.
    pub fn display(&self, element: ElementId) -> Option<&DisplayState> {
        self.displays.get(&element)
    }

    /// Replace the text of a control, as a user typing would.
    ///
    /// Select controls only accept one of their option values.
    pub fn type_text(&mut self, handle: ControlHandle, text: &str) -> bool {
        let Some(control) = self.controls.get_mut(&handle) else {
            return false;
        };
        if let MountedKind::Select(options) = &control.kind {
            if !options.iter().any(|option| option.value == text) {
                return false;
            }
        }
        control.text = text.to_string();
        true
    }
}

impl InputRenderer for MemoryRenderer {
    fn mount(
        &mut self,
        element: ElementId,
        spec: &ControlSpec<'_>,
        seed: &str,
    ) -> Result<ControlHandle, RenderError> {
        let (kind, text) = match spec.kind {
            ControlKind::TextBox => (MountedKind::TextBox, seed.to_string()),
            ControlKind::TextArea => (MountedKind::TextArea, seed.to_string()),
            ControlKind::Select(options) => {
                let selected = options
                    .iter()
                    .find(|option| option.value == seed)
                    .map(|option| option.value.clone())
                    .unwrap_or_default();
                (MountedKind::Select(options.to_vec()), selected)
            }
            ControlKind::DatePicker(format) => {
                (MountedKind::DatePicker(format.pattern().to_string()), seed.to_string())
            }
        };

        self.next_handle += 1;
        let handle = ControlHandle::new(self.next_handle);
        self.controls.insert(
            handle,
            MountedControl {
                element,
                kind,
                placeholder: spec.placeholder.to_string(),
                text,
                error: None,
            },
        );
        self.displays.entry(element).or_default().hidden = true;
        self.focused = Some(handle);
        self.mount_count += 1;
        Ok(handle)
    }

    fn read_raw_value(&self, handle: ControlHandle) -> Option<String> {
        self.controls.get(&handle).map(|control| control.text.clone())
    }

    fn unmount(&mut self, handle: ControlHandle) {
        let Some(control) = self.controls.remove(&handle) else {
            return;
        };
        if let Some(display) = self.displays.get_mut(&control.element) {
            display.hidden = false;
        }
        if self.focused == Some(handle) {
            self.focused = None;
        }
    }

    fn show_display(&mut self, element: ElementId, text: &str, empty: bool) {
        let display = self.displays.entry(element).or_default();
        display.text = text.to_string();
        display.empty = empty;
    }

    fn show_error(&mut self, handle: ControlHandle, message: Option<&str>) {
        if let Some(control) = self.controls.get_mut(&handle) {
            control.error = message.map(str::to_string);
        }
    }

    fn release(&mut self, element: ElementId) {
        self.displays.remove(&element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_format::DateFormat;

    fn options() -> Vec<SelectOption> {
        vec![SelectOption::new("a", "Alpha"), SelectOption::new("b", "Beta")]
    }

    #[test]
    fn test_mount_and_unmount() {
        let mut renderer = MemoryRenderer::new();
        let element = ElementId::new();
        let spec = ControlSpec {
            kind: ControlKind::TextBox,
            placeholder: "Name",
        };

        let handle = renderer.mount(element, &spec, "hello").unwrap();
        assert_eq!(renderer.read_raw_value(handle).as_deref(), Some("hello"));
        assert_eq!(renderer.focused(), Some(handle));
        assert!(renderer.display(element).unwrap().hidden);

        renderer.unmount(handle);
        renderer.unmount(handle);
        assert_eq!(renderer.mounted(), 0);
        assert!(!renderer.display(element).unwrap().hidden);
        assert_eq!(renderer.read_raw_value(handle), None);
    }

    #[test]
    fn test_select_preselects_matching_option() {
        let mut renderer = MemoryRenderer::new();
        let options = options();
        let spec = ControlSpec {
            kind: ControlKind::Select(&options),
            placeholder: "",
        };

        let handle = renderer.mount(ElementId::new(), &spec, "b").unwrap();
        assert_eq!(renderer.read_raw_value(handle).as_deref(), Some("b"));

        let none = renderer.mount(ElementId::new(), &spec, "zzz").unwrap();
        assert_eq!(renderer.read_raw_value(none).as_deref(), Some(""));
        assert!(!renderer.type_text(none, "zzz"));
        assert!(renderer.type_text(none, "a"));
    }

    #[test]
    fn test_date_picker_records_pattern() {
        let mut renderer = MemoryRenderer::new();
        let format = DateFormat::default();
        let spec = ControlSpec {
            kind: ControlKind::DatePicker(&format),
            placeholder: "",
        };
        let handle = renderer.mount(ElementId::new(), &spec, "2024-01-15").unwrap();
        let control = renderer.control(handle).unwrap();
        assert_eq!(control.kind, MountedKind::DatePicker("YYYY-MM-DD".to_string()));
    }

    #[test]
    fn test_error_indicator() {
        let mut renderer = MemoryRenderer::new();
        let spec = ControlSpec {
            kind: ControlKind::TextArea,
            placeholder: "",
        };
        let handle = renderer.mount(ElementId::new(), &spec, "").unwrap();
        renderer.show_error(handle, Some("bad"));
        assert_eq!(renderer.control(handle).unwrap().error.as_deref(), Some("bad"));
        renderer.show_error(handle, None);
        assert_eq!(renderer.control(handle).unwrap().error, None);
    }
}

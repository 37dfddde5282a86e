//! DOM renderer for WebAssembly.
//!
//! Builds real `<input>`, `<textarea>` and `<select>` controls next to the
//! bound element and forwards their key and blur events to a sink.

use crate::markup::{EMPTY_CLASS, ERROR_CLASS};
use qedit_core::{
    ControlEvent, ControlHandle, ControlKind, ControlSpec, ElementId, InputRenderer, Key, Modifiers,
    RenderError,
};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement,
    HtmlTextAreaElement, KeyboardEvent,
};

/// Receives events raised by mounted controls.
pub type ControlSink = Rc<dyn Fn(ControlHandle, ControlEvent)>;

/// Listener closures attached to a control.
struct Listeners {
    keydown: Closure<dyn FnMut(KeyboardEvent)>,
    blur: Closure<dyn FnMut(Event)>,
}

struct Mounted {
    host: Element,
    control: Element,
    error: Element,
    listeners: Listeners,
}

/// `InputRenderer` backed by the page DOM.
///
/// Note: not Send/Sync; DOM handles live on the main thread.
pub struct DomRenderer {
    document: Document,
    elements: HashMap<ElementId, Element>,
    controls: HashMap<ControlHandle, Mounted>,
    /// Listeners of unmounted controls. Kept until the next mount because an
    /// unmount can run inside one of these closures.
    retired: Vec<Listeners>,
    next_handle: u64,
    sink: ControlSink,
}

impl DomRenderer {
    pub fn new(document: Document, sink: ControlSink) -> Self {
        Self {
            document,
            elements: HashMap::new(),
            controls: HashMap::new(),
            retired: Vec::new(),
            next_handle: 0,
            sink,
        }
    }

    /// Associate an element id with its DOM node.
    pub fn register(&mut self, id: ElementId, element: Element) {
        self.elements.insert(id, element);
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    fn build_control(&self, spec: &ControlSpec<'_>, seed: &str) -> Result<Element, JsValue> {
        let control = match spec.kind {
            ControlKind::TextBox => {
                let input: HtmlInputElement = self.document.create_element("input")?.dyn_into()?;
                input.set_type("text");
                input.set_value(seed);
                input.set_placeholder(spec.placeholder);
                input.unchecked_into::<Element>()
            }
            ControlKind::TextArea => {
                let area: HtmlTextAreaElement =
                    self.document.create_element("textarea")?.dyn_into()?;
                area.set_value(seed);
                area.set_placeholder(spec.placeholder);
                area.unchecked_into::<Element>()
            }
            ControlKind::Select(options) => {
                let select: HtmlSelectElement =
                    self.document.create_element("select")?.dyn_into()?;
                for option in options {
                    let node = HtmlOptionElement::new_with_text_and_value(&option.label, &option.value)?;
                    select.append_child(&node)?;
                }
                let selected = options.iter().position(|option| option.value == seed);
                select.set_selected_index(selected.map_or(-1, |index| index as i32));
                select.unchecked_into::<Element>()
            }
            ControlKind::DatePicker(format) => {
                let input: HtmlInputElement = self.document.create_element("input")?.dyn_into()?;
                // Native pickers only speak ISO dates.
                if format.is_iso() {
                    input.set_type("date");
                } else {
                    input.set_type("text");
                }
                input.set_value(seed);
                if spec.placeholder.is_empty() {
                    input.set_placeholder(format.pattern());
                } else {
                    input.set_placeholder(spec.placeholder);
                }
                input.unchecked_into::<Element>()
            }
        };
        control.class_list().add_1("qedit-control")?;
        Ok(control)
    }

    fn attach_listeners(
        &self,
        handle: ControlHandle,
        control: &Element,
        multiline: bool,
    ) -> Result<Listeners, JsValue> {
        let sink = self.sink.clone();
        let keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let key = Key::from_name(&event.key());
            let modifiers = Modifiers {
                shift: event.shift_key(),
                ctrl: event.ctrl_key(),
                alt: event.alt_key(),
                meta: event.meta_key(),
            };
            let submits = match key {
                Key::Enter => !multiline || modifiers.action(),
                Key::Escape => true,
                Key::Other(_) => false,
            };
            if submits {
                event.prevent_default();
            }
            sink(handle, ControlEvent::KeyDown { key, modifiers });
        });

        let sink = self.sink.clone();
        let blur = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            sink(handle, ControlEvent::Blur);
        });

        control.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        control.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        Ok(Listeners { keydown, blur })
    }

    fn mount_in(
        &mut self,
        host: Element,
        spec: &ControlSpec<'_>,
        seed: &str,
    ) -> Result<ControlHandle, JsValue> {
        let control = self.build_control(spec, seed)?;
        let error = self.document.create_element("span")?;
        error.class_list().add_1(ERROR_CLASS)?;
        error.set_attribute("hidden", "")?;

        self.next_handle += 1;
        let handle = ControlHandle::new(self.next_handle);
        let multiline = matches!(spec.kind, ControlKind::TextArea);
        let listeners = self.attach_listeners(handle, &control, multiline)?;

        host.after_with_node_1(&control)?;
        control.after_with_node_1(&error)?;
        host.set_attribute("hidden", "")?;
        if let Some(focusable) = control.dyn_ref::<HtmlElement>() {
            focusable.focus()?;
        }

        self.controls.insert(
            handle,
            Mounted {
                host,
                control,
                error,
                listeners,
            },
        );
        Ok(handle)
    }
}

impl InputRenderer for DomRenderer {
    fn mount(
        &mut self,
        element: ElementId,
        spec: &ControlSpec<'_>,
        seed: &str,
    ) -> Result<ControlHandle, RenderError> {
        self.retired.clear();
        let host = self
            .elements
            .get(&element)
            .cloned()
            .ok_or_else(|| RenderError::UnknownElement(element.to_string()))?;
        self.mount_in(host, spec, seed)
            .map_err(|e| RenderError::Dom(format!("{:?}", e)))
    }

    fn read_raw_value(&self, handle: ControlHandle) -> Option<String> {
        let control = &self.controls.get(&handle)?.control;
        if let Some(input) = control.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(area) = control.dyn_ref::<HtmlTextAreaElement>() {
            Some(area.value())
        } else {
            control.dyn_ref::<HtmlSelectElement>().map(|select| select.value())
        }
    }

    fn unmount(&mut self, handle: ControlHandle) {
        let Some(mounted) = self.controls.remove(&handle) else {
            return;
        };
        // Detach first so removing the node does not raise a blur.
        let Mounted {
            host,
            control,
            error,
            listeners,
        } = mounted;
        let _ = control.remove_event_listener_with_callback(
            "keydown",
            listeners.keydown.as_ref().unchecked_ref(),
        );
        let _ = control
            .remove_event_listener_with_callback("blur", listeners.blur.as_ref().unchecked_ref());
        control.remove();
        error.remove();
        let _ = host.remove_attribute("hidden");
        self.retired.push(listeners);
    }

    fn show_display(&mut self, element: ElementId, text: &str, empty: bool) {
        let Some(host) = self.elements.get(&element) else {
            return;
        };
        host.set_text_content(Some(text));
        if let Err(e) = host.class_list().toggle_with_force(EMPTY_CLASS, empty) {
            log::warn!("Failed to toggle {}: {:?}", EMPTY_CLASS, e);
        }
    }

    fn show_error(&mut self, handle: ControlHandle, message: Option<&str>) {
        let Some(mounted) = self.controls.get(&handle) else {
            return;
        };
        mounted.error.set_text_content(message);
        let result = match message {
            Some(_) => mounted.error.remove_attribute("hidden"),
            None => mounted.error.set_attribute("hidden", ""),
        };
        if let Err(e) = result {
            log::warn!("Failed to update error indicator: {:?}", e);
        }
    }

    fn release(&mut self, element: ElementId) {
        self.elements.remove(&element);
    }
}

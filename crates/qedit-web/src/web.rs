//! WebAssembly entry point and JavaScript bindings.

use crate::dom::{ControlSink, DomRenderer};
use crate::markup::{self, ID_ATTRIBUTE, OPTIONS_ATTRIBUTE, VALUE_ATTRIBUTE};
use js_sys::{Function, Promise};
use qedit_core::{
    Activation, Commit, ControlEvent, ControlHandle, Dispatch, ElementId, HideReason, PendingSave,
    SaveTicket, Value, WidgetConfig, WidgetEvent, WidgetOptions, WidgetRegistry,
};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CustomEvent, CustomEventInit, Element, Event};

/// `detail` payload of dispatched `qedit:*` events.
#[derive(Serialize)]
struct EventDetail<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// A bound element and its click listener.
struct Binding {
    element: Element,
    on_click: Closure<dyn FnMut(Event)>,
}

struct Inner {
    registry: RefCell<WidgetRegistry<DomRenderer>>,
    bindings: RefCell<HashMap<ElementId, Binding>>,
}

impl Inner {
    fn new(document: web_sys::Document) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let sink: ControlSink = Rc::new(move |handle, event| {
                if let Some(inner) = weak.upgrade() {
                    inner.control_event(handle, event);
                }
            });
            Inner {
                registry: RefCell::new(WidgetRegistry::new(DomRenderer::new(document, sink))),
                bindings: RefCell::new(HashMap::new()),
            }
        })
    }

    fn click(self: &Rc<Self>, element: ElementId) {
        let Ok(mut registry) = self.registry.try_borrow_mut() else {
            return;
        };
        if let Activation::Failed(error) = registry.on_click(element) {
            log::error!("Could not open editor: {}", error);
        }
        drop(registry);
        self.flush_events();
    }

    fn control_event(self: &Rc<Self>, handle: ControlHandle, event: ControlEvent) {
        // Events raised while the registry is busy come from our own DOM
        // changes and carry nothing new.
        let Ok(mut registry) = self.registry.try_borrow_mut() else {
            log::debug!("Dropping re-entrant {:?}", event);
            return;
        };
        let dispatch = registry.on_control_event(handle, event);
        drop(registry);

        if let Dispatch::Commit(Commit::Saving(save)) = dispatch {
            self.spawn_save(save);
        }
        self.flush_events();
    }

    fn spawn_save(self: &Rc<Self>, save: PendingSave) {
        let weak = Rc::downgrade(self);
        wasm_bindgen_futures::spawn_local(async move {
            let (ticket, result) = save.wait().await;
            if let Some(inner) = weak.upgrade() {
                inner.finish_save(ticket, result);
            }
        });
    }

    /// Apply a save result. A busy registry defers it to a later task so the
    /// session never stays in Saving.
    fn finish_save(self: &Rc<Self>, ticket: SaveTicket, result: Result<(), String>) {
        let Ok(mut registry) = self.registry.try_borrow_mut() else {
            log::debug!("Registry busy; deferring save result for {}", ticket.element);
            let weak = Rc::downgrade(self);
            wasm_bindgen_futures::spawn_local(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.finish_save(ticket, result);
                }
            });
            return;
        };
        registry.finish_save(ticket, result);
        drop(registry);
        self.flush_events();
    }

    /// Drop an element's session and click listener. A busy registry defers
    /// the whole unbind to a later task so both always go together.
    fn unbind(self: &Rc<Self>, id: ElementId) {
        let Ok(mut registry) = self.registry.try_borrow_mut() else {
            log::debug!("Registry busy; deferring unbind of {}", id);
            let weak = Rc::downgrade(self);
            wasm_bindgen_futures::spawn_local(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.unbind(id);
                }
            });
            return;
        };
        registry.unbind(id);
        drop(registry);
        self.flush_events();
        if let Some(binding) = self.bindings.borrow_mut().remove(&id) {
            let _ = binding.element.remove_event_listener_with_callback(
                "click",
                binding.on_click.as_ref().unchecked_ref(),
            );
        }
    }

    /// Re-dispatch queued widget events as DOM `CustomEvent`s.
    fn flush_events(&self) {
        let events = match self.registry.try_borrow_mut() {
            Ok(mut registry) => registry.drain_events(),
            Err(_) => return,
        };
        for event in events {
            let (element, detail) = match &event {
                WidgetEvent::Shown { element } | WidgetEvent::StaleSave { element } => (
                    *element,
                    EventDetail {
                        value: None,
                        reason: None,
                        error: None,
                    },
                ),
                WidgetEvent::Hidden { element, reason } => (
                    *element,
                    EventDetail {
                        value: None,
                        reason: Some(reason_name(*reason)),
                        error: None,
                    },
                ),
                WidgetEvent::SaveStarted { element, value } | WidgetEvent::Saved { element, value } => (
                    *element,
                    EventDetail {
                        value: Some(value),
                        reason: None,
                        error: None,
                    },
                ),
                WidgetEvent::Rejected { element, error } => (
                    *element,
                    EventDetail {
                        value: None,
                        reason: None,
                        error: Some(error.message()),
                    },
                ),
            };
            let target = self
                .bindings
                .borrow()
                .get(&element)
                .map(|binding| binding.element.clone());
            if let Some(target) = target {
                if let Err(e) = emit(&target, markup::event_name(&event), &detail) {
                    log::warn!("Failed to dispatch {}: {:?}", markup::event_name(&event), e);
                }
            }
        }
    }
}

fn reason_name(reason: HideReason) -> &'static str {
    match reason {
        HideReason::Saved => "saved",
        HideReason::Cancelled => "cancelled",
        HideReason::Replaced => "replaced",
        HideReason::Unbound => "unbound",
    }
}

fn emit(target: &Element, name: &str, detail: &EventDetail<'_>) -> Result<(), JsValue> {
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&serde_wasm_bindgen::to_value(detail)?);
    let event = CustomEvent::new_with_event_init_dict(name, &init)?;
    target.dispatch_event(&event)?;
    Ok(())
}

/// Plain JavaScript form of a value: a string, or `null` when empty.
fn value_to_js(value: &Value) -> JsValue {
    match value {
        Value::Empty => JsValue::NULL,
        Value::Text(text) => JsValue::from_str(text),
        Value::Date(date) => JsValue::from_str(&date.to_string()),
    }
}

/// Message carried by a thrown value or rejection reason, if any.
fn thrown_message(error: &JsValue) -> Option<String> {
    if let Some(message) = error.as_string() {
        return Some(message);
    }
    error
        .dyn_ref::<js_sys::Error>()
        .map(|error| String::from(error.message()))
}

fn describe(error: JsValue) -> String {
    thrown_message(&error).unwrap_or_else(|| "Save failed".to_string())
}

/// Wrap a JavaScript save function. It may return a Promise; a rejection or
/// a thrown exception fails the save.
fn with_js_save(config: WidgetConfig, save: Function) -> WidgetConfig {
    config.with_save(move |value| {
        let called = save.call1(&JsValue::NULL, &value_to_js(value));
        async move {
            let returned = called.map_err(describe)?;
            if let Some(promise) = returned.dyn_ref::<Promise>() {
                JsFuture::from(promise.clone()).await.map_err(describe)?;
            }
            Ok::<(), String>(())
        }
    })
}

/// Wrap a JavaScript validator. A non-empty returned string is the error; a
/// thrown exception also rejects the value.
fn with_js_validator(config: WidgetConfig, validate: Function) -> WidgetConfig {
    config.with_validator(move |value| {
        let outcome = validate
            .call1(&JsValue::NULL, &value_to_js(value))
            .map(|result| result.as_string())
            .map_err(|error| thrown_message(&error).unwrap_or_default());
        markup::validation_message(outcome)
    })
}

fn element_id(element: &Element) -> Result<ElementId, JsValue> {
    if let Some(id) = element.get_attribute(ID_ATTRIBUTE).as_deref().and_then(ElementId::parse) {
        return Ok(id);
    }
    let id = ElementId::new();
    element.set_attribute(ID_ATTRIBUTE, &id.to_string())?;
    Ok(id)
}

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Click-to-edit widgets for a page.
#[wasm_bindgen]
pub struct QEdit {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl QEdit {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<QEdit, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;
        Ok(QEdit {
            inner: Inner::new(document),
        })
    }

    /// Bind an element. `options` follows `WidgetOptions` (camelCase keys).
    pub fn bind(
        &self,
        element: Element,
        options: JsValue,
        save: Option<Function>,
        validate: Option<Function>,
    ) -> Result<(), JsValue> {
        let options: WidgetOptions = if options.is_undefined() || options.is_null() {
            WidgetOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };
        self.bind_options(element, options, save, validate)
    }

    /// Bind every element matching `selector`, reading options from its
    /// `data-qedit` attribute.
    #[wasm_bindgen(js_name = bindAll)]
    pub fn bind_all(&self, selector: &str, save: Option<Function>) -> Result<u32, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;
        let nodes = document.query_selector_all(selector)?;
        let mut bound = 0;
        for index in 0..nodes.length() {
            let Some(element) = nodes.get(index).and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let attribute = element.get_attribute(OPTIONS_ATTRIBUTE);
            let options = markup::options_from_attribute(attribute.as_deref()).map_err(to_js_error)?;
            self.bind_options(element, options, save.clone(), None)?;
            bound += 1;
        }
        log::info!("Bound {} elements matching {}", bound, selector);
        Ok(bound)
    }

    /// Unbind an element. Safe on elements that were never bound.
    pub fn unbind(&self, element: Element) {
        let Some(id) = element.get_attribute(ID_ATTRIBUTE).as_deref().and_then(ElementId::parse)
        else {
            return;
        };
        self.inner.unbind(id);
    }

    /// The committed value of a bound element, or `undefined`.
    pub fn value(&self, element: Element) -> JsValue {
        let id = element.get_attribute(ID_ATTRIBUTE).as_deref().and_then(ElementId::parse);
        let Ok(registry) = self.inner.registry.try_borrow() else {
            return JsValue::UNDEFINED;
        };
        id.and_then(|id| registry.value(id))
            .map(value_to_js)
            .unwrap_or(JsValue::UNDEFINED)
    }
}

impl QEdit {
    fn bind_options(
        &self,
        element: Element,
        options: WidgetOptions,
        save: Option<Function>,
        validate: Option<Function>,
    ) -> Result<(), JsValue> {
        let mut config = options.into_config().map_err(to_js_error)?;
        if let Some(save) = save {
            config = with_js_save(config, save);
        }
        if let Some(validate) = validate {
            config = with_js_validator(config, validate);
        }

        let id = element_id(&element)?;
        let value = markup::initial_value(
            &config,
            element.get_attribute(VALUE_ATTRIBUTE).as_deref(),
            &element.text_content().unwrap_or_default(),
        );

        {
            let mut registry = self.inner.registry.try_borrow_mut().map_err(to_js_error)?;
            registry.renderer_mut().register(id, element.clone());
            registry.bind_with_value(id, config, value);
        }
        self.inner.flush_events();

        let mut bindings = self.inner.bindings.borrow_mut();
        if !bindings.contains_key(&id) {
            let weak = Rc::downgrade(&self.inner);
            let on_click = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                if let Some(inner) = weak.upgrade() {
                    inner.click(id);
                }
            });
            element.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
            bindings.insert(id, Binding { element, on_click });
        }
        log::debug!("Bound {}", id);
        Ok(())
    }
}

/// Initialize logging and panic reporting.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    // Fails only if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("qedit ready");
}

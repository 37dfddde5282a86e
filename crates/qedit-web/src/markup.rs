//! Markup conventions shared by the DOM renderer and bindings.

use qedit_core::{ConfigError, InputKind, Value, WidgetConfig, WidgetEvent, WidgetOptions};

/// Attribute holding a bound element's id.
pub const ID_ATTRIBUTE: &str = "data-qedit-id";
/// Attribute holding JSON widget options.
pub const OPTIONS_ATTRIBUTE: &str = "data-qedit";
/// Attribute holding the raw initial value, when the text is a label.
pub const VALUE_ATTRIBUTE: &str = "data-value";
/// Class set on elements showing the empty text.
pub const EMPTY_CLASS: &str = "qedit-empty";
/// Class set on the error indicator.
pub const ERROR_CLASS: &str = "qedit-error";

/// Read widget options from an optional `data-qedit` attribute.
pub fn options_from_attribute(attribute: Option<&str>) -> Result<WidgetOptions, ConfigError> {
    match attribute.map(str::trim) {
        Some(json) if !json.is_empty() => WidgetOptions::from_json(json),
        _ => Ok(WidgetOptions::default()),
    }
}

/// Work out the committed value an element starts with.
///
/// `data-value` wins over the text content. Text equal to the empty text, or
/// that does not parse for the input kind, starts the widget empty.
pub fn initial_value(config: &WidgetConfig, data_value: Option<&str>, text: &str) -> Value {
    let raw = match data_value {
        Some(raw) => raw.to_string(),
        None => {
            let text = text.trim();
            if text.is_empty() || text == config.empty_text() {
                return Value::Empty;
            }
            match config.kind() {
                InputKind::Select { options } => match options.iter().find(|o| o.label == text) {
                    Some(option) => option.value.clone(),
                    None => return Value::Empty,
                },
                _ => text.to_string(),
            }
        }
    };

    config.kind().parse(&raw).unwrap_or_else(|error| {
        log::debug!("Ignoring unparsable initial value {:?}: {}", raw, error);
        Value::Empty
    })
}

/// Error message from a script validator's outcome.
///
/// `Ok` holds the returned string, if any; an empty string passes. A thrown
/// exception (`Err`) always fails the value.
pub fn validation_message(outcome: Result<Option<String>, String>) -> Option<String> {
    match outcome {
        Ok(message) => message.filter(|message| !message.is_empty()),
        Err(thrown) if thrown.is_empty() => Some("Validation failed".to_string()),
        Err(thrown) => Some(thrown),
    }
}

/// DOM event name dispatched for a widget event.
pub fn event_name(event: &WidgetEvent) -> &'static str {
    match event {
        WidgetEvent::Shown { .. } => "qedit:shown",
        WidgetEvent::Hidden { .. } => "qedit:hidden",
        WidgetEvent::SaveStarted { .. } => "qedit:save",
        WidgetEvent::Saved { .. } => "qedit:saved",
        WidgetEvent::Rejected { .. } => "qedit:error",
        WidgetEvent::StaleSave { .. } => "qedit:stale",
    }
}

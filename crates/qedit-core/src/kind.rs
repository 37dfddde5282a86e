//! Input kinds and their per-kind formatting behavior.
//!
//! Each variant carries what it needs to seed, parse and display a value, so
//! adding a kind means adding a variant and its arms here.

use crate::date_format::DateFormat;
use crate::error::EditError;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One entry of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The kind of edit control a widget uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Single-line text box.
    Text,
    /// Multi-line text area.
    Textarea,
    /// Drop-down with ordered options.
    Select { options: Vec<SelectOption> },
    /// Date entry using a display/parse pattern.
    Date { format: DateFormat },
}

impl Default for InputKind {
    fn default() -> Self {
        Self::Text
    }
}

impl InputKind {
    /// Short name, as used in declarative options.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select { .. } => "select",
            Self::Date { .. } => "date",
        }
    }

    /// Check if plain Enter inserts a newline rather than committing.
    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Textarea)
    }

    /// Text shown while not editing, or `None` when the empty text applies.
    pub fn display(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (_, Value::Empty) => None,
            (Self::Select { options }, Value::Text(selected)) => options
                .iter()
                .find(|option| &option.value == selected)
                .map(|option| option.label.clone()),
            (Self::Date { format }, Value::Date(date)) => Some(format.format(*date)),
            (_, Value::Text(text)) if text.is_empty() => None,
            (_, Value::Text(text)) => Some(text.clone()),
            (_, Value::Date(date)) => Some(date.to_string()),
        }
    }

    /// Text used to seed the edit control. Never substitutes empty text.
    pub fn seed(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Empty) => String::new(),
            (Self::Date { format }, Value::Date(date)) => format.format(*date),
            (_, Value::Text(text)) => text.clone(),
            (_, Value::Date(date)) => date.to_string(),
        }
    }

    /// Turn raw control text back into a value.
    pub fn parse(&self, raw: &str) -> Result<Value, EditError> {
        match self {
            Self::Text | Self::Textarea | Self::Select { .. } => Ok(Value::text(raw)),
            Self::Date { .. } if raw.trim().is_empty() => Ok(Value::Empty),
            Self::Date { format } => format
                .parse(raw.trim())
                .map(Value::Date)
                .ok_or_else(|| EditError::Parse(format!("Expected a date like {}", format))),
        }
    }

    /// Control to mount for this kind.
    pub fn control(&self) -> ControlKind<'_> {
        match self {
            Self::Text => ControlKind::TextBox,
            Self::Textarea => ControlKind::TextArea,
            Self::Select { options } => ControlKind::Select(options),
            Self::Date { format } => ControlKind::DatePicker(format),
        }
    }
}

/// The control a renderer should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind<'a> {
    TextBox,
    TextArea,
    Select(&'a [SelectOption]),
    DatePicker(&'a DateFormat),
}

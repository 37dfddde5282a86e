//! Widget and registry configuration.

use crate::date_format::DateFormat;
use crate::kind::{InputKind, SelectOption};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use thiserror::Error;

/// Boxed future for save callbacks. Not `Send`: the widget runs on a UI thread.
pub type SaveFuture = Pin<Box<dyn Future<Output = Result<(), String>>>>;

/// Persists a committed value. `Err` carries the message shown to the user.
pub type SaveCallback = Rc<dyn Fn(&Value) -> SaveFuture>;

/// Checks a parsed value, returning an error message on failure.
pub type Validator = Rc<dyn Fn(&Value) -> Option<String>>;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Select input requires at least one option")]
    EmptyOptions,
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),
    #[error("Invalid options: {0}")]
    Parse(String),
}

/// What loss of focus does to an open control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurAction {
    #[default]
    Commit,
    Cancel,
    Ignore,
}

/// Declarative input type name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    Textarea,
    Select,
    Date,
}

/// Declarative widget options, as found in markup or passed from script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetOptions {
    pub input_type: InputType,
    pub options: Vec<SelectOption>,
    pub date_format: Option<String>,
    pub placeholder: Option<String>,
    pub empty_text: Option<String>,
    pub single_open_mode: bool,
    pub blur: BlurAction,
}

impl WidgetOptions {
    /// Parse options from JSON (e.g. a `data-qedit` attribute).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the input kind these options describe.
    pub fn kind(&self) -> Result<InputKind, ConfigError> {
        Ok(match self.input_type {
            InputType::Text => InputKind::Text,
            InputType::Textarea => InputKind::Textarea,
            InputType::Select => InputKind::Select {
                options: self.options.clone(),
            },
            InputType::Date => InputKind::Date {
                format: match &self.date_format {
                    Some(pattern) => DateFormat::new(pattern)?,
                    None => DateFormat::default(),
                },
            },
        })
    }

    /// Convert into a full configuration with the default save callback.
    pub fn into_config(self) -> Result<WidgetConfig, ConfigError> {
        let mut config = WidgetConfig::new(self.kind()?)?
            .with_single_open(self.single_open_mode)
            .with_blur(self.blur);
        if let Some(placeholder) = self.placeholder {
            config = config.with_placeholder(placeholder);
        }
        if let Some(empty_text) = self.empty_text {
            config = config.with_empty_text(empty_text);
        }
        Ok(config)
    }
}

/// Immutable per-element configuration. Replacing it requires re-binding.
#[derive(Clone)]
pub struct WidgetConfig {
    pub(crate) kind: InputKind,
    pub(crate) placeholder: String,
    pub(crate) empty_text: String,
    pub(crate) single_open: bool,
    pub(crate) blur: BlurAction,
    pub(crate) save: SaveCallback,
    pub(crate) validators: Vec<Validator>,
}

impl WidgetConfig {
    /// Text shown when a widget has no value.
    pub const DEFAULT_EMPTY_TEXT: &'static str = "Empty";

    /// Create a configuration for an input kind.
    ///
    /// Values are accepted locally until a save callback is supplied.
    pub fn new(kind: InputKind) -> Result<Self, ConfigError> {
        if let InputKind::Select { options } = &kind {
            if options.is_empty() {
                return Err(ConfigError::EmptyOptions);
            }
        }
        Ok(Self {
            kind,
            placeholder: String::new(),
            empty_text: Self::DEFAULT_EMPTY_TEXT.to_string(),
            single_open: false,
            blur: BlurAction::default(),
            save: Rc::new(|_: &Value| -> SaveFuture { Box::pin(async { Ok(()) }) }),
            validators: Vec::new(),
        })
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_empty_text(mut self, empty_text: impl Into<String>) -> Self {
        self.empty_text = empty_text.into();
        self
    }

    /// Allow at most one open widget across the registry.
    pub fn with_single_open(mut self, single_open: bool) -> Self {
        self.single_open = single_open;
        self
    }

    pub fn with_blur(mut self, blur: BlurAction) -> Self {
        self.blur = blur;
        self
    }

    /// Set the save callback.
    pub fn with_save<F, Fut>(mut self, save: F) -> Self
    where
        F: Fn(&Value) -> Fut + 'static,
        Fut: Future<Output = Result<(), String>> + 'static,
    {
        self.save = Rc::new(move |value: &Value| -> SaveFuture { Box::pin(save(value)) });
        self
    }

    /// Append a validator. Validators run in insertion order.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + 'static,
    {
        self.validators.push(Rc::new(validator));
        self
    }

    pub fn kind(&self) -> &InputKind {
        &self.kind
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn empty_text(&self) -> &str {
        &self.empty_text
    }

    pub fn single_open(&self) -> bool {
        self.single_open
    }

    pub fn blur(&self) -> BlurAction {
        self.blur
    }

    /// Run validators in order, stopping at the first failure.
    pub fn validate(&self, value: &Value) -> Option<String> {
        self.validators.iter().find_map(|validator| validator(value))
    }
}

impl fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("kind", &self.kind)
            .field("placeholder", &self.placeholder)
            .field("empty_text", &self.empty_text)
            .field("single_open", &self.single_open)
            .field("blur", &self.blur)
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}

/// What single-open mode does when the other open widget is mid-save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingConflict {
    /// Ignore the new activation; the save runs to completion.
    #[default]
    Refuse,
    /// Close the saving widget; its eventual result is discarded.
    ForceCancel,
}

/// Registry-wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub saving_conflict: SavingConflict,
}

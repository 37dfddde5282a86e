//! Value formatting for display and edit controls.

use crate::config::WidgetConfig;
use crate::error::EditError;
use crate::value::Value;

/// Text shown for a value while the widget is not editing.
///
/// Falls back to the configured empty text for empty values and for select
/// values with no matching option.
pub fn to_display(value: &Value, config: &WidgetConfig) -> String {
    config
        .kind()
        .display(value)
        .unwrap_or_else(|| config.empty_text().to_string())
}

/// Check if [`to_display`] would show the empty text.
pub fn is_empty_display(value: &Value, config: &WidgetConfig) -> bool {
    config.kind().display(value).is_none()
}

/// Text used to seed the edit control.
pub fn to_edit_text(value: &Value, config: &WidgetConfig) -> String {
    config.kind().seed(value)
}

/// Parse raw control text.
pub fn parse_edit(raw: &str, config: &WidgetConfig) -> Result<Value, EditError> {
    config.kind().parse(raw)
}

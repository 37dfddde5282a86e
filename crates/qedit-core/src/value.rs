//! Stored widget values and calendar dates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A committed widget value.
///
/// The core never inspects a value beyond formatting it; persistence is left
/// to the save callback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// No value set.
    #[default]
    Empty,
    /// Plain text (also used for select values).
    Text(String),
    /// A calendar date.
    Date(CalendarDate),
}

impl Value {
    /// Create a text value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Check if the value has nothing to display.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Date(_) => false,
        }
    }

    /// Get the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the date, if this is a date value.
    pub fn as_date(&self) -> Option<CalendarDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<CalendarDate> for Value {
    fn from(date: CalendarDate) -> Self {
        Self::Date(date)
    }
}

/// A validated proleptic Gregorian date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate {
    year: i32,
    month: u8,
    day: u8,
}

impl CalendarDate {
    /// Create a date, returning `None` if it does not exist on the calendar.
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Parse an ISO `YYYY-MM-DD` date.
    pub fn from_iso(text: &str) -> Option<Self> {
        let mut parts = text.splitn(3, '-');
        let year = parts.next()?.parse().ok()?;
        let month = parts.next()?.parse().ok()?;
        let day = parts.next()?.parse().ok()?;
        Self::new(year, month, day)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::from_iso(&text).ok_or_else(|| format!("Invalid date: {}", text))
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_dates() {
        assert!(CalendarDate::new(2024, 1, 15).is_some());
        assert!(CalendarDate::new(2024, 2, 29).is_some());
        assert!(CalendarDate::new(2000, 2, 29).is_some());
    }

    #[test]
    fn test_invalid_dates() {
        assert!(CalendarDate::new(2024, 2, 30).is_none());
        assert!(CalendarDate::new(2023, 2, 29).is_none());
        assert!(CalendarDate::new(1900, 2, 29).is_none());
        assert!(CalendarDate::new(2024, 13, 1).is_none());
        assert!(CalendarDate::new(2024, 4, 31).is_none());
        assert!(CalendarDate::new(2024, 1, 0).is_none());
    }

    #[test]
    fn test_iso_display() {
        let date = CalendarDate::from_iso("2024-02-20").unwrap();
        assert_eq!(date.to_string(), "2024-02-20");
        assert_eq!(date.month(), 2);
        assert!(CalendarDate::from_iso("2024-02").is_none());
    }

    #[test]
    fn test_date_serializes_as_iso() {
        let value = Value::Date(CalendarDate::new(2024, 1, 15).unwrap());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"date","value":"2024-01-15"}"#);

        let bad = serde_json::from_str::<Value>(r#"{"type":"date","value":"2024-02-30"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_value_is_empty() {
        assert!(Value::Empty.is_empty());
        assert!(Value::text("").is_empty());
        assert!(!Value::text("x").is_empty());
        assert!(!Value::Date(CalendarDate::new(2024, 1, 1).unwrap()).is_empty());
    }
}

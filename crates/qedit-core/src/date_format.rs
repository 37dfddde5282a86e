//! Moment-style date patterns (`YYYY-MM-DD`, `D MMM YYYY`, ...).

use crate::config::ConfigError;
use crate::value::CalendarDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// `YYYY`
    Year4,
    /// `YY`
    Year2,
    /// `MMMM`
    MonthName,
    /// `MMM`
    MonthShort,
    /// `MM`
    Month2,
    /// `M`
    Month,
    /// `DD`
    Day2,
    /// `D`
    Day,
    Literal(String),
}

/// A compiled date pattern used to format and strictly parse dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateFormat {
    pattern: String,
    tokens: Vec<Token>,
}

impl DateFormat {
    /// The ISO pattern, `YYYY-MM-DD`.
    pub const ISO: &'static str = "YYYY-MM-DD";

    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let tokens = tokenize(pattern)?;
        if !tokens.iter().any(|t| matches!(t, Token::Year4 | Token::Year2))
            || !tokens.iter().any(|t| {
                matches!(t, Token::MonthName | Token::MonthShort | Token::Month2 | Token::Month)
            })
            || !tokens.iter().any(|t| matches!(t, Token::Day2 | Token::Day))
        {
            return Err(ConfigError::InvalidDateFormat(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
            tokens,
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if this is the ISO pattern (usable by native date pickers).
    pub fn is_iso(&self) -> bool {
        self.pattern == Self::ISO
    }

    /// Format a date with this pattern.
    pub fn format(&self, date: CalendarDate) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Year4 => out.push_str(&format!("{:04}", date.year())),
                Token::Year2 => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
                Token::MonthName => out.push_str(month_name(date.month())),
                Token::MonthShort => out.push_str(&month_name(date.month())[..3]),
                Token::Month2 => out.push_str(&format!("{:02}", date.month())),
                Token::Month => out.push_str(&date.month().to_string()),
                Token::Day2 => out.push_str(&format!("{:02}", date.day())),
                Token::Day => out.push_str(&date.day().to_string()),
                Token::Literal(text) => out.push_str(text),
            }
        }
        out
    }

    /// Parse text that must match the pattern exactly and name a real date.
    pub fn parse(&self, text: &str) -> Option<CalendarDate> {
        let mut rest = text;
        let mut year = None;
        let mut month = None;
        let mut day = None;

        for token in &self.tokens {
            match token {
                Token::Year4 => year = Some(take_digits(&mut rest, 4, 4)? as i32),
                Token::Year2 => {
                    let yy = take_digits(&mut rest, 2, 2)? as i32;
                    year = Some(if yy <= 68 { 2000 + yy } else { 1900 + yy });
                }
                Token::MonthName => month = Some(take_month_name(&mut rest, false)?),
                Token::MonthShort => month = Some(take_month_name(&mut rest, true)?),
                Token::Month2 => month = Some(take_digits(&mut rest, 2, 2)? as u8),
                Token::Month => month = Some(take_digits(&mut rest, 1, 2)? as u8),
                Token::Day2 => day = Some(take_digits(&mut rest, 2, 2)? as u8),
                Token::Day => day = Some(take_digits(&mut rest, 1, 2)? as u8),
                Token::Literal(lit) => rest = rest.strip_prefix(lit.as_str())?,
            }
        }

        if !rest.is_empty() {
            return None;
        }
        CalendarDate::new(year?, month?, day?)
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: Self::ISO.to_string(),
            tokens: vec![
                Token::Year4,
                Token::Literal("-".to_string()),
                Token::Month2,
                Token::Literal("-".to_string()),
                Token::Day2,
            ],
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl TryFrom<String> for DateFormat {
    type Error = ConfigError;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        Self::new(&pattern)
    }
}

impl From<DateFormat> for String {
    fn from(format: DateFormat) -> Self {
        format.pattern
    }
}

fn month_name(month: u8) -> &'static str {
    MONTH_NAMES[usize::from(month.clamp(1, 12)) - 1]
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    literal.push(inner);
                }
                if !closed {
                    return Err(ConfigError::InvalidDateFormat(pattern.to_string()));
                }
            }
            'Y' | 'M' | 'D' => {
                let mut run = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    run += 1;
                }
                let token = match (c, run) {
                    ('Y', 4) => Token::Year4,
                    ('Y', 2) => Token::Year2,
                    ('M', 4) => Token::MonthName,
                    ('M', 3) => Token::MonthShort,
                    ('M', 2) => Token::Month2,
                    ('M', 1) => Token::Month,
                    ('D', 2) => Token::Day2,
                    ('D', 1) => Token::Day,
                    _ => return Err(ConfigError::InvalidDateFormat(pattern.to_string())),
                };
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(token);
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Consume between `min` and `max` ASCII digits.
fn take_digits(rest: &mut &str, min: usize, max: usize) -> Option<u32> {
    let len = rest
        .bytes()
        .take(max)
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len < min {
        return None;
    }
    let (digits, tail) = rest.split_at(len);
    *rest = tail;
    digits.parse().ok()
}

/// Consume a month name (case-insensitive), full or abbreviated.
fn take_month_name(rest: &mut &str, short: bool) -> Option<u8> {
    for (index, name) in MONTH_NAMES.iter().enumerate() {
        let name: &str = if short { &name[..3] } else { name };
        let Some(head) = rest.get(..name.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(name) {
            *rest = &rest[name.len()..];
            return Some(index as u8 + 1);
        }
    }
    None
}

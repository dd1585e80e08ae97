//! Amount formatting and input handling.
//!
//! Amounts are kept as full-precision text (what the user typed or the lossless
//! rendering of a computed `f64`). Display strings are derived from that text on
//! demand and are never fed back into conversion math.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Fractional digits used when the magnitude-based rule would round a nonzero
/// value down to zero.
const ZERO_GUARD_PLACES: usize = 8;

/// Maximum fractional digits for a value, picked by its magnitude.
pub fn decimal_places(value: f64) -> usize {
    if value >= 1.0 {
        2
    } else if value >= 0.01 {
        4
    } else {
        6
    }
}

fn round_to(value: f64, places: usize) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

fn is_zero_text(text: &str) -> bool {
    text.bytes().all(|b| b == b'0' || b == b'.')
}

/// Inserts `,` between every group of three digits of an integer string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Adds thousands separators to the integer part of a plain decimal string.
pub fn format_number(text: &str) -> String {
    match text.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{}", group_thousands(int_part), frac_part),
        None => group_thousands(text),
    }
}

fn trim_fraction(fixed: &str) -> &str {
    match fixed.split_once('.') {
        Some((int_part, _)) => {
            let trimmed = fixed.trim_end_matches('0');
            if trimmed.len() == int_part.len() + 1 {
                int_part
            } else {
                trimmed
            }
        }
        None => fixed,
    }
}

/// Formats a numeric amount for display.
///
/// Rounds to 2, 4 or 6 fractional digits depending on magnitude, escalating
/// when that would hide a nonzero value, then trims trailing zeros and groups
/// the integer part. Zero, negative and non-finite values render as `"0"`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".to_string();
    }

    let places = decimal_places(value);
    let mut fixed = format!("{:.*}", places, round_to(value, places));

    if is_zero_text(&fixed) {
        fixed = format!("{:.*}", ZERO_GUARD_PLACES, round_to(value, ZERO_GUARD_PLACES));
        if is_zero_text(&fixed) {
            // Below the guard precision: widen up to the first significant digit.
            let places = (-value.log10()).ceil().max(ZERO_GUARD_PLACES as f64) as usize;
            fixed = format!("{value:.places$}");
        }
    }

    format_number(trim_fraction(&fixed))
}

/// Formats raw or previously formatted amount text for display.
///
/// Text ending in `.` is returned untouched so partially typed input does not
/// jump around. Thousands separators are accepted, so formatting a display
/// string again yields the same string.
pub fn format_input(text: &str) -> String {
    if text.ends_with('.') {
        return text.to_string();
    }
    match parse_amount(text) {
        Some(value) => format_amount(value),
        None => "0".to_string(),
    }
}

/// Parses amount text, ignoring thousands separators.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats an exchange rate with four fixed decimals, or `...` while unknown.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format_number(&format!("{rate:.4}")),
        None => "...".to_string(),
    }
}

/// Result of cleaning raw keyboard input for an amount field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEdit {
    /// Cleaned digits with at most one decimal point.
    Value(String),
    /// Nothing usable was entered; the field resets to zero.
    Empty,
    /// More than one decimal point; the previous value is kept.
    Rejected,
}

/// Strips everything except digits and `.` from raw input.
pub fn sanitize_input(raw: &str) -> InputEdit {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.matches('.').count() > 1 {
        InputEdit::Rejected
    } else if cleaned.is_empty() || cleaned == "." {
        InputEdit::Empty
    } else {
        InputEdit::Value(cleaned)
    }
}

/// An amount held at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn zero() -> Self {
        Amount("0".to_string())
    }

    /// Wraps already sanitized input text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Amount(text.into())
    }

    /// Renders a computed value without losing precision.
    pub fn from_value(value: f64) -> Self {
        if value == 0.0 || !value.is_finite() {
            Self::zero()
        } else {
            Amount(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> Option<f64> {
        parse_amount(&self.0)
    }

    /// True when the text parses to a nonzero number.
    pub fn is_nonzero(&self) -> bool {
        self.0 != "0" && self.value().is_some_and(|v| v != 0.0)
    }

    pub fn display(&self) -> String {
        format_input(&self.0)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Describes how long ago a millisecond timestamp was, relative to `now`.
pub fn format_relative(timestamp_ms: i64, now: DateTime<Utc>) -> String {
    let Some(then) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) else {
        return "Unknown".to_string();
    };

    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    then.format("%Y-%m-%d").to_string()
}

//! Conversion between human time strings and seconds.
//!
//! Accepted input is `SS`, `MM:SS` or `HH:MM:SS`; only the seconds field may
//! carry a fraction. A field that is not the most significant one must stay
//! below 60, so `75:00` is 75 minutes while `1:75:00` is rejected.
//!
//! `format_timestamp` works at millisecond resolution (round half up), so
//! input with more than three decimals does not survive a round trip
//! unchanged: `"00:00:01.2346"` comes back as `"00:00:01.235"`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid timestamp '{value}': {reason}")]
pub struct TimestampError {
    pub value: String,
    pub reason: &'static str,
}

impl TimestampError {
    fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

pub fn parse_timestamp(text: &str) -> Result<f64, TimestampError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::new(text, "empty timestamp"));
    }

    let fields: Vec<&str> = trimmed.split(':').collect();
    if fields.len() > 3 {
        return Err(TimestampError::new(text, "more than three fields"));
    }

    let (seconds_field, higher) = fields
        .split_last()
        .ok_or_else(|| TimestampError::new(text, "empty timestamp"))?;

    let seconds = parse_seconds_field(text, seconds_field)?;
    if !higher.is_empty() && seconds >= 60.0 {
        return Err(TimestampError::new(text, "seconds must be below 60"));
    }

    // Remaining fields, least significant first: minutes, then hours
    let mut total = seconds;
    let mut scale = 60.0;
    for (position, field) in higher.iter().rev().enumerate() {
        let value = parse_integer_field(text, field)?;
        let most_significant = position == higher.len() - 1;
        if !most_significant && value >= 60 {
            return Err(TimestampError::new(text, "minutes must be below 60"));
        }
        total += value as f64 * scale;
        scale *= 60.0;
    }

    if !total.is_finite() {
        return Err(TimestampError::new(text, "field out of range"));
    }
    Ok(total)
}

fn parse_seconds_field(text: &str, field: &str) -> Result<f64, TimestampError> {
    if field.is_empty() {
        return Err(TimestampError::new(text, "missing seconds"));
    }
    if field.starts_with('-') {
        return Err(TimestampError::new(text, "negative field"));
    }
    let well_formed = field.chars().all(|c| c.is_ascii_digit() || c == '.')
        && field.chars().filter(|c| *c == '.').count() <= 1
        && field.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(TimestampError::new(text, "seconds are not a number"));
    }
    let seconds = field
        .parse::<f64>()
        .map_err(|_| TimestampError::new(text, "seconds are not a number"))?;
    if !seconds.is_finite() {
        return Err(TimestampError::new(text, "field out of range"));
    }
    Ok(seconds)
}

fn parse_integer_field(text: &str, field: &str) -> Result<u64, TimestampError> {
    if field.starts_with('-') {
        return Err(TimestampError::new(text, "negative field"));
    }
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(TimestampError::new(text, "hours and minutes must be whole numbers"));
    }
    field
        .parse::<u64>()
        .map_err(|_| TimestampError::new(text, "field out of range"))
}

/// Render seconds as `HH:MM:SS`, adding `.mmm` only when the millisecond
/// part is non-zero. Negative and non-finite input renders as zero.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    // f64::round rounds half away from zero, which is half-up for non-negative values
    let total_ms = (seconds * 1000.0).round().min(u64::MAX as f64) as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;

    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;

    if ms == 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}.{ms:03}")
    }
}

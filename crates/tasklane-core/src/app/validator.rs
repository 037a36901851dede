//! Validator - リクエスト JSON の検証
//!
//! 検証順序は固定で、最初の失敗で止まります。
//! 呼び出し元に返るメッセージが常に同じになるようにするためです。
//!
//! 1. title / description / priority の存在
//! 2. title の型・空文字・長さ
//! 3. description の型・空文字・長さ
//! 4. priority の値（完全一致・大文字小文字を区別）
//! 5. due_date の形式（ISO 8601）

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::domain::{Priority, Task, ValidationError};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

const REQUIRED_FIELDS: [&str; 3] = ["title", "description", "priority"];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Validates a raw request object into a [`Task`].
///
/// Pure: no side effects, same input same answer.
pub fn validate(raw: &Value) -> Result<Task, ValidationError> {
    let fields = raw.as_object().ok_or(ValidationError::TypeMismatch {
        field: "request body",
        expected: "a JSON object",
    })?;

    for field in REQUIRED_FIELDS {
        if !fields.contains_key(field) {
            return Err(ValidationError::MissingField(field));
        }
    }

    let title = text_field(fields, "title", TITLE_MAX_CHARS)?;
    let description = text_field(fields, "description", DESCRIPTION_MAX_CHARS)?;

    let priority = fields
        .get("priority")
        .and_then(Value::as_str)
        .filter(|p| Priority::parse_exact(p).is_some())
        .ok_or(ValidationError::InvalidEnum {
            field: "priority",
            allowed: &Priority::NAMES,
        })?;

    let due_date = match fields.get("due_date") {
        None | Some(Value::Null) => None,
        Some(Value::String(due_date)) => {
            if parse_iso8601(due_date).is_none() {
                return Err(ValidationError::InvalidTimestamp("due_date"));
            }
            Some(due_date.clone())
        }
        Some(_) => {
            return Err(ValidationError::TypeMismatch {
                field: "due_date",
                expected: "a string in ISO 8601 format",
            });
        }
    };

    Ok(Task {
        title: title.to_string(),
        description: description.to_string(),
        priority: priority.to_string(),
        due_date,
    })
}

fn text_field<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
    max_chars: usize,
) -> Result<&'a str, ValidationError> {
    let value = fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::TypeMismatch {
            field,
            expected: "a string",
        })?;

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyValue(field));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::LengthExceeded {
            field,
            max: max_chars,
        });
    }
    Ok(value)
}

/// Parses an ISO 8601 date or date-time. A trailing `Z` means `+00:00`.
///
/// Basic (`20251231T235959`) and reduced-precision (`2025-12-31T23`) forms are
/// expanded to the extended form first; the separator may be `T`, `t` or a
/// space. Offsets are dropped: the result is only used to decide whether the
/// value is well-formed.
pub fn parse_iso8601(value: &str) -> Option<NaiveDateTime> {
    let normalized = expand_iso8601(value);

    if let Ok(at) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(at.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(at) = DateTime::parse_from_str(&normalized, format) {
            return Some(at.naive_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(at);
        }
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Rewrites a value into `YYYY-MM-DD[(T| )HH:MM[:SS[.f]][±HH:MM]]` when it is
/// in a shorter ISO 8601 form. Anything unrecognized is passed through.
fn expand_iso8601(value: &str) -> String {
    let value = match value.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };

    let Some(at) = value.find(['T', 't', ' ']) else {
        return expand_date(&value);
    };
    let (date, rest) = value.split_at(at);
    let separator = if rest.starts_with(' ') { ' ' } else { 'T' };
    let time = &rest[1..];
    let (clock, offset) = match time.find(['+', '-']) {
        Some(i) => time.split_at(i),
        None => (time, ""),
    };

    format!(
        "{}{separator}{}{}",
        expand_date(date),
        expand_clock(clock),
        expand_offset(offset)
    )
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYYMMDD` → `YYYY-MM-DD`
fn expand_date(date: &str) -> String {
    if date.len() == 8 && all_digits(date) {
        format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..])
    } else {
        date.to_string()
    }
}

/// `HH` → `HH:00`, `HHMM` → `HH:MM`, `HHMMSS[.f]` → `HH:MM:SS[.f]`
fn expand_clock(clock: &str) -> String {
    let (main, fraction) = match clock.find(['.', ',']) {
        Some(i) => (&clock[..i], format!(".{}", &clock[i + 1..])),
        None => (clock, String::new()),
    };
    if !all_digits(main) {
        return clock.to_string();
    }
    match main.len() {
        2 => format!("{main}:00{fraction}"),
        4 => format!("{}:{}{fraction}", &main[..2], &main[2..]),
        6 => format!("{}:{}:{}{fraction}", &main[..2], &main[2..4], &main[4..]),
        _ => clock.to_string(),
    }
}

/// `±HH` → `±HH:00`, `±HHMM` → `±HH:MM`
fn expand_offset(offset: &str) -> String {
    let Some(digits) = offset.get(1..) else {
        return offset.to_string();
    };
    if !all_digits(digits) {
        return offset.to_string();
    }
    let sign = &offset[..1];
    match digits.len() {
        2 => format!("{sign}{digits}:00"),
        4 => format!("{sign}{}:{}", &digits[..2], &digits[2..]),
        _ => offset.to_string(),
    }
}

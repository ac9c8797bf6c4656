//! Field-level coercion for request payloads.
//!
//! Browser forms submit everything as strings (`"42"`, `"50000.00"`, `""`), so scalars are
//! coerced server-side the same way for every resource: canonical numeric/date strings are
//! accepted, a blank string counts as "not provided", anything else is a field error.
//! Errors are collected so a single 400 names every offending field.

use crate::error::AppError;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::str::FromStr;

#[derive(Debug, Default)]
pub struct FieldErrors {
    missing: Vec<&'static str>,
    invalid: Vec<String>,
}

fn is_blank(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    fn require<T>(&mut self, field: &'static str, value: Option<T>, was_blank: bool) -> Option<T> {
        if value.is_none() && was_blank {
            self.missing.push(field);
        }
        value
    }

    fn invalid(&mut self, field: &'static str, expected: &str) {
        self.invalid
            .push(format!("Invalid value for {}: expected {}", field, expected));
    }

    /// Optional free text. Numbers and booleans are stringified.
    pub fn text(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<String> {
        match v {
            None => None,
            Some(v) if is_blank(v) => None,
            Some(JsonValue::String(s)) => Some(s.trim().to_string()),
            Some(v @ (JsonValue::Number(_) | JsonValue::Bool(_))) => Some(v.to_string()),
            Some(_) => {
                self.invalid(field, "a string");
                None
            }
        }
    }

    pub fn required_text(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<String> {
        let blank = v.map_or(true, is_blank);
        let value = self.text(field, v);
        self.require(field, value, blank)
    }

    /// Optional positive integer identifier.
    pub fn id(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<i32> {
        let parsed = match v {
            None => return None,
            Some(v) if is_blank(v) => return None,
            Some(JsonValue::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Some(JsonValue::String(s)) => s.trim().parse::<i32>().ok(),
            Some(_) => None,
        };
        match parsed {
            Some(id) if id > 0 => Some(id),
            _ => {
                self.invalid(field, "a positive integer");
                None
            }
        }
    }

    pub fn required_id(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<i32> {
        let blank = v.map_or(true, is_blank);
        let value = self.id(field, v);
        self.require(field, value, blank)
    }

    /// Non-negative monetary amount.
    pub fn required_amount(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<Decimal> {
        let blank = v.map_or(true, is_blank);
        let parsed = match v {
            None => None,
            Some(v) if is_blank(v) => None,
            Some(JsonValue::Number(n)) => Some(Decimal::from_str(&n.to_string()).ok()),
            Some(JsonValue::String(s)) => Some(Decimal::from_str(s.trim()).ok()),
            Some(_) => Some(None),
        };
        let value = match parsed {
            None => None,
            Some(Some(d)) if !d.is_sign_negative() || d.is_zero() => Some(d),
            Some(_) => {
                self.invalid(field, "a non-negative number");
                None
            }
        };
        self.require(field, value, blank)
    }

    /// Calendar date as `YYYY-MM-DD`; RFC 3339 timestamps are truncated to their date.
    pub fn date(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<NaiveDate> {
        match v {
            None => None,
            Some(v) if is_blank(v) => None,
            Some(JsonValue::String(s)) => match parse_date(s.trim()) {
                Some(d) => Some(d),
                None => {
                    self.invalid(field, "a date (YYYY-MM-DD)");
                    None
                }
            },
            Some(_) => {
                self.invalid(field, "a date (YYYY-MM-DD)");
                None
            }
        }
    }

    pub fn required_date(&mut self, field: &'static str, v: Option<&JsonValue>) -> Option<NaiveDate> {
        let blank = v.map_or(true, is_blank);
        let value = self.date(field, v);
        self.require(field, value, blank)
    }

    /// Records a cross-field rule failure.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.invalid.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("Missing required fields: {}", self.missing.join(", ")));
        }
        parts.extend(self.invalid);
        Err(AppError::Validation(parts.join("; ")))
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Shared error for the unreachable case where `finish()` passed but a required value is absent.
pub(crate) fn missing(fields: &str) -> AppError {
    AppError::Validation(format!("Missing required fields: {}", fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_strings_count_as_missing() {
        let mut f = FieldErrors::new();
        assert_eq!(f.required_text("FirstName", Some(&json!("   "))), None);
        assert_eq!(f.required_text("LastName", None), None);
        let err = f.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: FirstName, LastName"
        );
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let mut f = FieldErrors::new();
        assert_eq!(f.id("DepartmentID", Some(&json!("7"))), Some(7));
        assert_eq!(f.id("DepartmentID", Some(&json!(""))), None);
        assert_eq!(
            f.required_amount("BasicSalary", Some(&json!("50000.50"))),
            Some(Decimal::from_str("50000.50").unwrap())
        );
        assert_eq!(
            f.required_amount("Allowances", Some(&json!(0))),
            Some(Decimal::ZERO)
        );
        assert!(f.finish().is_ok());
    }

    #[test]
    fn mistyped_values_are_rejected() {
        let mut f = FieldErrors::new();
        assert_eq!(f.id("DepartmentID", Some(&json!("abc"))), None);
        assert_eq!(f.id("ManagerID", Some(&json!(-3))), None);
        assert_eq!(f.text("Phone", Some(&json!({"n": 1}))), None);
        assert_eq!(f.required_amount("BasicSalary", Some(&json!(-1))), None);
        let msg = f.finish().unwrap_err().to_string();
        assert!(msg.contains("DepartmentID"));
        assert!(msg.contains("ManagerID"));
        assert!(msg.contains("Phone"));
        assert!(msg.contains("BasicSalary"));
        assert!(!msg.contains("Missing"));
    }

    #[test]
    fn dates_accept_plain_and_rfc3339_forms() {
        let mut f = FieldErrors::new();
        let expected = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(f.date("DateOfJoining", Some(&json!("2024-04-01"))), Some(expected));
        assert_eq!(
            f.date("DateOfJoining", Some(&json!("2024-04-01T00:00:00.000Z"))),
            Some(expected)
        );
        assert_eq!(f.date("DateOfJoining", Some(&json!("01/04/2024"))), None);
        assert!(f.finish().is_err());
    }
}

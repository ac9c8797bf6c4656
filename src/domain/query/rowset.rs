//! Conversion of arbitrary PostgreSQL rows into JSON scalars.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};
use sqlx::postgres::types::{Oid, PgInterval};
use sqlx::postgres::{PgHasArrayType, PgRow, PgValueFormat};
use sqlx::Postgres;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use utoipa::ToSchema;

/// Column name (as returned by the store) to scalar value, in store order.
pub type JsonRow = Map<String, JsonValue>;

#[derive(Serialize, Debug, Default, Clone, PartialEq, ToSchema)]
pub struct Rowset {
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<JsonRow>,
    /// True when the row cap dropped trailing rows.
    pub truncated: bool,
}

fn float(v: f64) -> JsonValue {
    Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// Integral values stay exact; fractional ones become floats. Anything a JSON number
/// cannot carry faithfully is returned as its decimal string.
pub fn decimal_to_json(d: Decimal) -> JsonValue {
    if d.fract().is_zero() {
        if let Some(i) = d.to_i64() {
            return JsonValue::from(i);
        }
    }
    match d.to_f64() {
        Some(f) if f.is_finite() && f.to_string() == d.normalize().to_string() => float(f),
        _ => JsonValue::String(d.to_string()),
    }
}

pub fn timestamp_to_json(ts: NaiveDateTime) -> JsonValue {
    JsonValue::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn bytes_to_json(bytes: &[u8]) -> JsonValue {
    JsonValue::String(format!("\\x{}", hex::encode(bytes)))
}

fn column_value(row: &PgRow, idx: usize, type_name: &str) -> Result<JsonValue, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(JsonValue::Null);
    }

    let value = match type_name {
        "BOOL" => JsonValue::Bool(row.try_get::<bool, _>(idx)?),
        "INT2" => JsonValue::from(row.try_get::<i16, _>(idx)?),
        "INT4" => JsonValue::from(row.try_get::<i32, _>(idx)?),
        "INT8" => JsonValue::from(row.try_get::<i64, _>(idx)?),
        "OID" => JsonValue::from(row.try_get::<Oid, _>(idx)?.0),
        "FLOAT4" => float(f64::from(row.try_get::<f32, _>(idx)?)),
        "FLOAT8" => float(row.try_get::<f64, _>(idx)?),
        // NaN, infinities and values beyond Decimal's range are rendered from the raw value.
        "NUMERIC" => match row.try_get::<Decimal, _>(idx) {
            Ok(d) => decimal_to_json(d),
            Err(_) => raw_fallback(row, idx, type_name)?,
        },
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => JsonValue::String(row.try_get::<String, _>(idx)?),
        "DATE" => JsonValue::String(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "TIME" => JsonValue::String(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        "TIMESTAMP" => timestamp_to_json(row.try_get::<NaiveDateTime, _>(idx)?),
        "TIMESTAMPTZ" => JsonValue::String(row.try_get::<DateTime<Utc>, _>(idx)?.to_rfc3339()),
        "INTERVAL" => JsonValue::String(interval_text(&row.try_get::<PgInterval, _>(idx)?)),
        "BYTEA" => bytes_to_json(&row.try_get::<Vec<u8>, _>(idx)?),
        "JSON" | "JSONB" => JsonValue::String(row.try_get::<JsonValue, _>(idx)?.to_string()),
        "VOID" => JsonValue::Null,
        "BOOL[]" => array_or_raw(row, idx, type_name, |v: &bool| {
            (if *v { "t" } else { "f" }).to_string()
        })?,
        "INT2[]" => array_or_raw(row, idx, type_name, i16::to_string)?,
        "INT4[]" => array_or_raw(row, idx, type_name, i32::to_string)?,
        "INT8[]" => array_or_raw(row, idx, type_name, i64::to_string)?,
        "FLOAT8[]" => array_or_raw(row, idx, type_name, f64::to_string)?,
        "NUMERIC[]" => array_or_raw(row, idx, type_name, Decimal::to_string)?,
        "TEXT[]" | "VARCHAR[]" | "NAME[]" | "BPCHAR[]" => {
            array_or_raw(row, idx, type_name, |v: &String| quote_array_element(v))?
        }
        _ => raw_fallback(row, idx, type_name)?,
    };
    Ok(value)
}

/// Renders a one-dimensional array in the server's text form (`{1,2,NULL}`).
fn array_or_raw<T>(
    row: &PgRow,
    idx: usize,
    type_name: &str,
    element: impl Fn(&T) -> String,
) -> Result<JsonValue, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + PgHasArrayType,
{
    match row.try_get::<Vec<Option<T>>, _>(idx) {
        Ok(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| item.as_ref().map_or_else(|| "NULL".to_string(), &element))
                .collect();
            Ok(JsonValue::String(format!("{{{}}}", parts.join(","))))
        }
        // Multi-dimensional arrays do not decode into a Vec.
        Err(_) => raw_fallback(row, idx, type_name),
    }
}

fn quote_array_element(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s.eq_ignore_ascii_case("NULL")
        || s.chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | ',' | '"' | '\\'));
    if !needs_quotes {
        return s.to_string();
    }
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Server-style interval text, e.g. `1 year 2 mons 3 days 04:05:06.5`.
pub fn interval_text(interval: &PgInterval) -> String {
    fn unit(n: i64, singular: &str, plural: &str) -> String {
        format!("{} {}", n, if n == 1 || n == -1 { singular } else { plural })
    }

    let mut parts = Vec::new();
    let years = i64::from(interval.months / 12);
    let months = i64::from(interval.months % 12);
    if years != 0 {
        parts.push(unit(years, "year", "years"));
    }
    if months != 0 {
        parts.push(unit(months, "mon", "mons"));
    }
    if interval.days != 0 {
        parts.push(unit(i64::from(interval.days), "day", "days"));
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let secs = abs / 1_000_000;
        let frac = abs % 1_000_000;
        let mut clock = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if frac != 0 {
            let digits = format!("{:06}", frac);
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

/// Canonical text of a UUID from its 16 raw bytes.
fn uuid_text(bytes: &[u8]) -> Option<String> {
    if bytes.len() != 16 {
        return None;
    }
    let h = hex::encode(bytes);
    Some(format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    ))
}

/// Decimal text of a binary NUMERIC (base-10000 digit groups), including `NaN` and
/// the infinities.
pub fn numeric_binary_text(bytes: &[u8]) -> Option<String> {
    let word = |at: usize| -> Option<u16> {
        let pair = bytes.get(at..at + 2)?;
        Some(u16::from_be_bytes([pair[0], pair[1]]))
    };
    let ndigits = usize::from(word(0)?);
    let weight = i64::from(word(2)? as i16);
    let sign = word(4)?;
    let dscale = usize::from(word(6)?);
    match sign {
        0xC000 => return Some("NaN".to_string()),
        0xD000 => return Some("Infinity".to_string()),
        0xF000 => return Some("-Infinity".to_string()),
        0x0000 | 0x4000 => {}
        _ => return None,
    }
    let mut digits = Vec::with_capacity(ndigits);
    for k in 0..ndigits {
        digits.push(word(8 + 2 * k)?);
    }
    let digit = |g: i64| -> u16 {
        usize::try_from(g)
            .ok()
            .and_then(|g| digits.get(g).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for g in 0..=weight {
            if g == 0 {
                out.push_str(&digit(g).to_string());
            } else {
                out.push_str(&format!("{:04}", digit(g)));
            }
        }
    }
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut g = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit(g)));
            g += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Some(out)
}

/// Text for a value with no dedicated mapping, taken from its raw bytes: text-format and
/// text-like binary values (enums, citext, xml) are returned as is, anything else as hex.
pub fn raw_to_json(type_name: &str, binary: bool, bytes: &[u8]) -> JsonValue {
    if binary {
        let special = match type_name {
            "UUID" => uuid_text(bytes),
            "NUMERIC" => numeric_binary_text(bytes),
            _ => None,
        };
        if let Some(text) = special {
            return JsonValue::String(text);
        }
    }
    match std::str::from_utf8(bytes) {
        Ok(text) if !binary || !text.contains('\0') => JsonValue::String(text.to_string()),
        _ => bytes_to_json(bytes),
    }
}

fn raw_fallback(row: &PgRow, idx: usize, type_name: &str) -> Result<JsonValue, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    let binary = matches!(raw.format(), PgValueFormat::Binary);
    match raw.as_bytes() {
        Ok(bytes) => Ok(raw_to_json(type_name, binary, bytes)),
        Err(_) => Ok(JsonValue::String(format!("<unsupported type {}>", type_name))),
    }
}

/// Normalizes one row, preserving the store's column order.
pub fn row_to_json(row: &PgRow) -> Result<JsonRow, sqlx::Error> {
    let mut out = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let value = column_value(row, column.ordinal(), column.type_info().name())?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn integral_decimals_stay_integers() {
        assert_eq!(decimal_to_json(Decimal::from(42)), json!(42));
        assert_eq!(decimal_to_json(Decimal::from_str("42.00").unwrap()), json!(42));
    }

    #[test]
    fn fractional_decimals_become_numbers() {
        assert_eq!(decimal_to_json(Decimal::from_str("1500.25").unwrap()), json!(1500.25));
    }

    #[test]
    fn unrepresentable_decimals_become_strings() {
        let d = Decimal::from_str("0.1234567890123456789012345").unwrap();
        assert_eq!(decimal_to_json(d), json!("0.1234567890123456789012345"));
    }

    #[test]
    fn timestamps_are_iso_8601() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        assert_eq!(timestamp_to_json(ts), json!("2024-02-29T13:05:00"));
    }

    #[test]
    fn bytes_use_postgres_hex_form() {
        assert_eq!(bytes_to_json(&[0xde, 0xad]), json!("\\xdead"));
    }

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for w in [digits.len() as u16, weight as u16, sign, dscale] {
            out.extend_from_slice(&w.to_be_bytes());
        }
        for d in digits {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out
    }

    #[test]
    fn binary_numerics_render_as_decimal_text() {
        assert_eq!(numeric_binary_text(&numeric(0, 0, 1, &[1, 5000])).as_deref(), Some("1.5"));
        assert_eq!(
            numeric_binary_text(&numeric(-2, 0x4000, 8, &[12])).as_deref(),
            Some("-0.00000012")
        );
        assert_eq!(
            numeric_binary_text(&numeric(10, 0, 0, &[1])).as_deref(),
            Some(format!("1{}", "0".repeat(40)).as_str())
        );
        assert_eq!(numeric_binary_text(&numeric(0, 0xC000, 0, &[])).as_deref(), Some("NaN"));
        assert_eq!(numeric_binary_text(&[0, 1]), None);
    }

    #[test]
    fn intervals_use_server_text() {
        let iv = PgInterval {
            months: 14,
            days: 3,
            microseconds: 14_706_500_000,
        };
        assert_eq!(interval_text(&iv), "1 year 2 mons 3 days 04:05:06.5");
        let day = PgInterval {
            months: 0,
            days: 1,
            microseconds: 0,
        };
        assert_eq!(interval_text(&day), "1 day");
        let zero = PgInterval {
            months: 0,
            days: 0,
            microseconds: 0,
        };
        assert_eq!(interval_text(&zero), "00:00:00");
    }

    #[test]
    fn unmapped_values_fall_back_to_text_or_hex() {
        let uuid = hex::decode("a0eebc999c0b4ef8bb6d6bb9bd380a11").unwrap();
        assert_eq!(
            raw_to_json("UUID", true, &uuid),
            json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11")
        );
        // Enum labels arrive as their text even in binary format.
        assert_eq!(raw_to_json("mood", true, b"happy"), json!("happy"));
        assert_eq!(raw_to_json("point", true, &[0, 0, 0xff]), json!("\\x0000ff"));
        assert_eq!(raw_to_json("point", false, b"(1,2)"), json!("(1,2)"));
    }

    #[test]
    fn array_elements_are_quoted_like_the_server() {
        assert_eq!(quote_array_element("abc"), "abc");
        assert_eq!(quote_array_element("b c"), "\"b c\"");
        assert_eq!(quote_array_element(""), "\"\"");
        assert_eq!(quote_array_element("null"), "\"null\"");
        assert_eq!(quote_array_element("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn rowset_serializes_rows_and_flag() {
        let mut row = JsonRow::new();
        row.insert("b".into(), json!(1));
        row.insert("a".into(), json!(null));
        let rs = Rowset {
            rows: vec![row],
            truncated: false,
        };
        let text = serde_json::to_string(&rs).unwrap();
        assert_eq!(text, r#"{"rows":[{"b":1,"a":null}],"truncated":false}"#);
    }
}

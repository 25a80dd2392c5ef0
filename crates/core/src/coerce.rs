//! Coerce-with-fallback for loosely typed numeric inputs.
//!
//! Ads platforms and settings stores hand numbers over as JSON numbers,
//! numeric strings, or not at all. Everything that turns such a value into
//! an `f64` goes through [`to_f64`] so there is exactly one definition of
//! what counts as "a number".

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a loosely typed value as a finite `f64`.
///
/// Accepts JSON numbers and strings that parse as numbers (surrounding
/// whitespace ignored). Returns `None` for null, booleans, arrays, objects,
/// unparseable strings and non-finite results.
pub fn to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Coerce an optional value, falling back to `default` when it is absent
/// or not a number.
pub fn or_default(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(to_f64).unwrap_or(default)
}

/// Serde adapter for optional metric fields.
///
/// Missing fields, `null` and non-numeric values all deserialize to `None`;
/// a malformed metric never rejects the whole record.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(to_f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings() {
        assert_eq!(to_f64(&json!(1.5)), Some(1.5));
        assert_eq!(to_f64(&json!(42)), Some(42.0));
        assert_eq!(to_f64(&json!("20")), Some(20.0));
        assert_eq!(to_f64(&json!(" 3.25 ")), Some(3.25));
    }

    #[test]
    fn non_numbers_are_none() {
        assert_eq!(to_f64(&Value::Null), None);
        assert_eq!(to_f64(&json!(true)), None);
        assert_eq!(to_f64(&json!("twenty")), None);
        assert_eq!(to_f64(&json!("")), None);
        assert_eq!(to_f64(&json!([1, 2])), None);
        assert_eq!(to_f64(&json!({"v": 1})), None);
    }

    #[test]
    fn non_finite_strings_are_rejected() {
        assert_eq!(to_f64(&json!("NaN")), None);
        assert_eq!(to_f64(&json!("inf")), None);
    }

    #[test]
    fn or_default_falls_back() {
        assert_eq!(or_default(None, 30.0), 30.0);
        assert_eq!(or_default(Some(&json!("abc")), 30.0), 30.0);
        assert_eq!(or_default(Some(&json!("12.5")), 30.0), 12.5);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_f64")]
        v: Option<f64>,
    }

    #[test]
    fn lenient_field_deserialization() {
        let p: Probe = serde_json::from_str(r#"{"v": "1.25"}"#).unwrap();
        assert_eq!(p.v, Some(1.25));
        let p: Probe = serde_json::from_str(r#"{"v": null}"#).unwrap();
        assert_eq!(p.v, None);
        let p: Probe = serde_json::from_str(r#"{"v": "n/a"}"#).unwrap();
        assert_eq!(p.v, None);
        let p: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.v, None);
    }
}

//! Parameter value coercion.
//!
//! Callers hand us raw JSON values, often stringly typed ("42", "true",
//! "2024-01-01"). Before binding, each value is classified into the
//! narrowest type the downstream driver can bind natively. Already-typed
//! JSON (numbers, booleans, null) passes through untouched; only strings
//! are inspected.
//!
//! Classification order for strings:
//! 1. `true`/`false` (case-insensitive) -> boolean
//! 2. `YYYY-MM-DD...` prefix -> timestamp (offset, naive, or bare date);
//!    unparseable date-lookalikes stay text
//! 3. contains `.` -> float, otherwise integer; parse failure stays text

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid date prefix pattern"));

/// A coerced parameter value, ready for named binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Timestamp(TemporalValue),
    Text(String),
    /// JSON arrays pass through element-wise, e.g. for IN lists.
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Coerce a raw request value.
    pub fn coerce(raw: &serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => ParamValue::Null,
            serde_json::Value::Bool(b) => ParamValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Integer(i),
                None => ParamValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::coerce_str(s),
            serde_json::Value::Array(items) => {
                ParamValue::List(items.iter().map(Self::coerce).collect())
            }
            // Opaque structured values bind as their JSON text
            serde_json::Value::Object(_) => {
                ParamValue::Text(serde_json::to_string(raw).unwrap_or_default())
            }
        }
    }

    fn coerce_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
            return ParamValue::Boolean(s.eq_ignore_ascii_case("true"));
        }

        if DATE_PREFIX.is_match(s) {
            return match TemporalValue::parse(s) {
                Some(t) => ParamValue::Timestamp(t),
                None => ParamValue::Text(s.to_string()),
            };
        }

        if s.contains('.') {
            match s.parse::<f64>() {
                Ok(f) => ParamValue::Float(f),
                Err(_) => ParamValue::Text(s.to_string()),
            }
        } else {
            match s.parse::<i64>() {
                Ok(i) => ParamValue::Integer(i),
                Err(_) => ParamValue::Text(s.to_string()),
            }
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => ParamValue::Null,
        }
    }
}

/// A coerced temporal value at one of three precisions.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalValue {
    /// Timezone-aware instant (RFC 3339)
    Offset(chrono::DateTime<chrono::FixedOffset>),
    /// Wall-clock datetime without zone
    Local(chrono::NaiveDateTime),
    /// Calendar date
    Date(chrono::NaiveDate),
}

impl TemporalValue {
    /// Parse a date-prefixed string at the best precision it carries.
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Some(TemporalValue::Offset(dt));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(TemporalValue::Local(dt));
            }
        }
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(TemporalValue::Date(d));
        }
        None
    }

    /// ISO-8601 representation at the carried precision.
    pub fn to_iso_string(&self) -> String {
        match self {
            TemporalValue::Offset(dt) => dt.to_rfc3339(),
            TemporalValue::Local(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            TemporalValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso_string())
    }
}

impl Serialize for TemporalValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_iso_string())
    }
}

/// Render a template-authored JSON literal as SQL text.
///
/// Numbers and booleans render bare, as do strings that are themselves
/// complete numbers. Everything else is single-quoted with `''` escaping.
/// Arrays render as a parenthesized list for IN comparisons.
pub fn sql_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => {
            if s.parse::<i64>().is_ok() || s.parse::<f64>().is_ok() {
                s.clone()
            } else {
                format!("'{}'", s.replace('\'', "''"))
            }
        }
        serde_json::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(sql_literal).collect();
            format!("({})", rendered.join(", "))
        }
        serde_json::Value::Object(_) => {
            let text = serde_json::to_string(value).unwrap_or_default();
            format!("'{}'", text.replace('\'', "''"))
        }
    }
}

/// The bare string form of a value: strings unquoted, everything else as
/// compact JSON. Used when a value is spliced into a transform pattern or
/// a sort template.
pub fn plain_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True for values a condition treats as "not provided": JSON null or a
/// blank string.
pub fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numeric_strings() {
        assert_eq!(ParamValue::coerce(&json!("42")), ParamValue::Integer(42));
        assert_eq!(ParamValue::coerce(&json!("-7")), ParamValue::Integer(-7));
        assert_eq!(ParamValue::coerce(&json!("3.14")), ParamValue::Float(3.14));
        assert_eq!(
            ParamValue::coerce(&json!("1.2.3")),
            ParamValue::Text("1.2.3".to_string())
        );
    }

    #[test]
    fn test_coerce_boolean_strings() {
        assert_eq!(ParamValue::coerce(&json!("true")), ParamValue::Boolean(true));
        assert_eq!(ParamValue::coerce(&json!("FALSE")), ParamValue::Boolean(false));
    }

    #[test]
    fn test_coerce_passthrough() {
        assert_eq!(ParamValue::coerce(&json!(42)), ParamValue::Integer(42));
        assert_eq!(ParamValue::coerce(&json!(2.5)), ParamValue::Float(2.5));
        assert_eq!(ParamValue::coerce(&json!(true)), ParamValue::Boolean(true));
        assert_eq!(ParamValue::coerce(&json!(null)), ParamValue::Null);
    }

    #[test]
    fn test_coerce_temporals() {
        match ParamValue::coerce(&json!("2024-01-01")) {
            ParamValue::Timestamp(TemporalValue::Date(d)) => {
                assert_eq!(d.to_string(), "2024-01-01");
            }
            other => panic!("expected date, got {:?}", other),
        }

        assert!(matches!(
            ParamValue::coerce(&json!("2024-01-01T10:30:00")),
            ParamValue::Timestamp(TemporalValue::Local(_))
        ));
        assert!(matches!(
            ParamValue::coerce(&json!("2024-01-01 10:30:00")),
            ParamValue::Timestamp(TemporalValue::Local(_))
        ));
        assert!(matches!(
            ParamValue::coerce(&json!("2024-01-01T10:30:00Z")),
            ParamValue::Timestamp(TemporalValue::Offset(_))
        ));
        assert!(matches!(
            ParamValue::coerce(&json!("2024-01-01T10:30:00-05:00")),
            ParamValue::Timestamp(TemporalValue::Offset(_))
        ));

        // Date-shaped but invalid: stays text, never numeric
        assert_eq!(
            ParamValue::coerce(&json!("2024-13-99")),
            ParamValue::Text("2024-13-99".to_string())
        );
    }

    #[test]
    fn test_coerce_collections() {
        assert_eq!(
            ParamValue::coerce(&json!(["1", "b", 3])),
            ParamValue::List(vec![
                ParamValue::Integer(1),
                ParamValue::Text("b".to_string()),
                ParamValue::Integer(3),
            ])
        );
        assert_eq!(
            ParamValue::coerce(&json!({"k": 1})),
            ParamValue::Text(r#"{"k":1}"#.to_string())
        );
    }

    #[test]
    fn test_serialize_shapes() {
        let v = serde_json::to_value(ParamValue::Integer(42)).unwrap();
        assert_eq!(v, json!(42));
        let v = serde_json::to_value(ParamValue::coerce(&json!("2024-01-01"))).unwrap();
        assert_eq!(v, json!("2024-01-01"));
        let v = serde_json::to_value(ParamValue::Null).unwrap();
        assert_eq!(v, json!(null));
    }

    #[test]
    fn test_sql_literal_rendering() {
        assert_eq!(sql_literal(&json!(5)), "5");
        assert_eq!(sql_literal(&json!(true)), "true");
        assert_eq!(sql_literal(&json!("5")), "5");
        assert_eq!(sql_literal(&json!("active")), "'active'");
        assert_eq!(sql_literal(&json!("it's")), "'it''s'");
        assert_eq!(sql_literal(&json!([1, "a"])), "(1, 'a')");
        assert_eq!(sql_literal(&json!(null)), "NULL");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text(&json!("x")), "x");
        assert_eq!(plain_text(&json!(42)), "42");
        assert_eq!(plain_text(&json!(true)), "true");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("   ")));
        assert!(!is_blank(&json!("x")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
    }
}

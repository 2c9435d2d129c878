//! Cell values.

use chrono::NaiveDateTime;
use serde::de::{self, Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Field of the JSON object holding a timestamp cell.
const TIMESTAMP_FIELD: &str = "timestamp";

/// A single cell.
///
/// `Int` and `Float` together form the numeric kind. Floats held in a table
/// are always finite; use [`Value::float`] to build one from arithmetic.
///
/// In JSON a cell is `null`, a boolean, a number or a string, except for
/// timestamps which are written as `{"timestamp": "2020-08-07T05:12:00"}` so
/// that text shaped like a date stays text.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Explicit "no value", distinct from zero or an empty string.
    #[default]
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Wrap a float, mapping NaN and infinities to `Absent`.
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            Self::Float(v)
        } else {
            Self::Absent
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Numeric view of the value; `None` for anything but `Int`/`Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "text",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Timestamp(_) => 3,
            Self::Text(_) => 4,
        }
    }

    /// Total order used to sort categories.
    ///
    /// Absent < boolean < numeric < timestamp < text. Integers and floats
    /// compare numerically with each other, text compares lexicographically.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    /// Hashable identity of a present value; `None` for `Absent`.
    ///
    /// A float holding a whole number shares the key of that integer, so a
    /// numeric column mixing `Int(1)` and `Float(1.0)` has one category.
    pub(crate) fn key(&self) -> Option<ValueKey> {
        match self {
            Self::Absent => None,
            Self::Bool(b) => Some(ValueKey::Bool(*b)),
            Self::Int(i) => Some(ValueKey::Int(*i)),
            Self::Float(f) => Some(whole(*f).map_or(ValueKey::Float(f.to_bits()), ValueKey::Int)),
            Self::Timestamp(t) => Some(ValueKey::Timestamp(*t)),
            Self::Text(s) => Some(ValueKey::Text(s.clone())),
        }
    }
}

/// The integer `f` holds exactly, if any. Covers `-0.0`.
fn whole(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f.abs() < 9.2e18).then(|| f as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            // whole floats keep their decimal point: 1.0, not 1
            Self::Float(v) if whole(*v).is_some() && v.abs() < 1e16 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Timestamp(t) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(TIMESTAMP_FIELD, t)?;
                map.end()
            }
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a boolean, a number, a string or a timestamp object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Absent)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Absent)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        if v.is_finite() {
            Ok(Value::Float(v))
        } else {
            Err(E::custom(format!("non-finite number {v}")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::text(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let field: String = map
            .next_key()?
            .ok_or_else(|| A::Error::missing_field(TIMESTAMP_FIELD))?;
        if field != TIMESTAMP_FIELD {
            return Err(A::Error::unknown_field(&field, &[TIMESTAMP_FIELD]));
        }
        let timestamp: NaiveDateTime = map.next_value()?;
        if map.next_key::<String>()?.is_some() {
            return Err(A::Error::custom("a timestamp object has exactly one field"));
        }
        Ok(Value::Timestamp(timestamp))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    Timestamp(NaiveDateTime),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_rejects_non_finite() {
        assert_eq!(Value::float(f64::NAN), Value::Absent);
        assert_eq!(Value::float(f64::INFINITY), Value::Absent);
        assert_eq!(Value::float(1.5), Value::Float(1.5));
    }

    #[test]
    fn test_total_cmp_orders_kinds_then_values() {
        let mut values = vec![
            Value::text("b"),
            Value::Int(3),
            Value::Absent,
            Value::Float(2.5),
            Value::text("a"),
            Value::Bool(true),
        ];
        values.sort_by(Value::total_cmp);
        assert_eq!(
            values,
            vec![
                Value::Absent,
                Value::Bool(true),
                Value::Float(2.5),
                Value::Int(3),
                Value::text("a"),
                Value::text("b"),
            ]
        );
    }

    #[test]
    fn test_json_is_plain_for_scalars() {
        let values = vec![Value::Absent, Value::Int(3), Value::text("3+")];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,3,"3+"]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_display_matches_csv_rendering() {
        assert_eq!(Value::Absent.to_string(), "");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(-0.0).to_string(), "-0.0");
        assert_eq!(Value::Int(1).to_string(), "1");
    }

    #[test]
    fn test_date_shaped_text_stays_text() {
        let values = vec![Value::text("2020-01-01T00:00:00"), Value::Float(3.0)];
        let json = serde_json::to_string(&values).unwrap();
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_timestamp_json_round_trip() {
        let at = chrono::NaiveDate::from_ymd_opt(2020, 8, 7)
            .and_then(|d| d.and_hms_opt(5, 12, 0))
            .unwrap();
        let json = serde_json::to_value(Value::Timestamp(at)).unwrap();
        assert_eq!(json, serde_json::json!({ "timestamp": "2020-08-07T05:12:00" }));

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Timestamp(at));
        assert!(serde_json::from_str::<Value>(r#"{ "date": "2020-08-07" }"#).is_err());
    }

    #[test]
    fn test_whole_floats_share_integer_key() {
        assert_eq!(Value::Float(1.0).key(), Value::Int(1).key());
        assert_eq!(Value::Float(-0.0).key(), Value::Int(0).key());
        assert_ne!(Value::Float(1.5).key(), Value::Int(1).key());
        assert_ne!(Value::Float(1.0), Value::Int(1));
    }
}

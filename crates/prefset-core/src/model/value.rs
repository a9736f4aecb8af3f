use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a preference
///
/// Determines how raw input and stored values are coerced before they are
/// cached or compared. `Any` performs no coercion at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer,
    Float,
    String,
    Any,
}

impl ValueType {
    /// Whether values of this type are numeric (zero is falsy, blank means null)
    pub fn is_number(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Any => "any",
        }
    }

    /// Coerce a raw value into this type
    ///
    /// Mirrors relational column type casting: `Null` stays `Null`, blank
    /// strings become `Null` for every non-string type, lists only survive
    /// under `Any`.
    pub fn cast(&self, value: &PrefValue) -> PrefValue {
        if value.is_null() {
            return PrefValue::Null;
        }
        match self {
            ValueType::Any => value.clone(),
            ValueType::Boolean => cast_boolean(value),
            ValueType::Integer => cast_integer(value),
            ValueType::Float => cast_float(value),
            ValueType::String => cast_string(value),
        }
    }

    /// Truthiness of a value under this type
    ///
    /// The value is cast first. Null is false, numeric types are false only
    /// at zero, everything else is false only when blank.
    pub fn truthiness(&self, value: &PrefValue) -> bool {
        let cast = self.cast(value);
        if self.is_number() {
            return match cast {
                PrefValue::Integer(i) => i != 0,
                PrefValue::Float(f) => f != 0.0,
                _ => false,
            };
        }
        !cast.is_blank()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(ValueType::Boolean),
            "integer" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "string" => Ok(ValueType::String),
            "any" => Ok(ValueType::Any),
            other => Err(format!("unknown value type: {}", other)),
        }
    }
}

/// A preference value, raw or cast
///
/// Serializes untagged, so the JSON form is a plain scalar or array. That
/// JSON text is what the persistence layer stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PrefValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PrefValue>),
}

impl PrefValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PrefValue::Null)
    }

    /// Null, false, whitespace-only strings and empty lists are blank
    pub fn is_blank(&self) -> bool {
        match self {
            PrefValue::Null => true,
            PrefValue::Boolean(b) => !b,
            PrefValue::String(s) => s.trim().is_empty(),
            PrefValue::List(items) => items.is_empty(),
            PrefValue::Integer(_) | PrefValue::Float(_) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrefValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PrefValue::Float(f) => Some(*f),
            PrefValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Encode as the JSON text used for storage
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from stored JSON text
    pub fn from_json(raw: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Null => f.write_str("null"),
            PrefValue::Boolean(b) => write!(f, "{}", b),
            PrefValue::Integer(i) => write!(f, "{}", i),
            PrefValue::Float(x) => write!(f, "{}", x),
            PrefValue::String(s) => write!(f, "{:?}", s),
            PrefValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Boolean(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Integer(value)
    }
}

impl From<i32> for PrefValue {
    fn from(value: i32) -> Self {
        PrefValue::Integer(value.into())
    }
}

impl From<f64> for PrefValue {
    fn from(value: f64) -> Self {
        PrefValue::Float(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::String(value.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::String(value)
    }
}

impl<T: Into<PrefValue>> From<Option<T>> for PrefValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PrefValue::Null, Into::into)
    }
}

impl<T: Into<PrefValue>> From<Vec<T>> for PrefValue {
    fn from(value: Vec<T>) -> Self {
        PrefValue::List(value.into_iter().map(Into::into).collect())
    }
}

const FALSE_STRINGS: &[&str] = &["0", "f", "F", "false", "FALSE", "off", "OFF"];

fn cast_boolean(value: &PrefValue) -> PrefValue {
    match value {
        PrefValue::Boolean(b) => PrefValue::Boolean(*b),
        PrefValue::Integer(i) => PrefValue::Boolean(*i != 0),
        PrefValue::Float(f) => PrefValue::Boolean(*f != 0.0),
        PrefValue::String(s) if s.trim().is_empty() => PrefValue::Null,
        PrefValue::String(s) => PrefValue::Boolean(!FALSE_STRINGS.contains(&s.as_str())),
        PrefValue::List(_) | PrefValue::Null => PrefValue::Null,
    }
}

fn cast_integer(value: &PrefValue) -> PrefValue {
    match value {
        PrefValue::Integer(i) => PrefValue::Integer(*i),
        PrefValue::Float(f) => PrefValue::Integer(f.trunc() as i64),
        PrefValue::Boolean(b) => PrefValue::Integer(i64::from(*b)),
        PrefValue::String(s) if s.trim().is_empty() => PrefValue::Null,
        PrefValue::String(s) => PrefValue::Integer(leading_integer(s)),
        PrefValue::List(_) | PrefValue::Null => PrefValue::Null,
    }
}

fn cast_float(value: &PrefValue) -> PrefValue {
    match value {
        PrefValue::Float(f) => PrefValue::Float(*f),
        PrefValue::Integer(i) => PrefValue::Float(*i as f64),
        PrefValue::Boolean(b) => PrefValue::Float(if *b { 1.0 } else { 0.0 }),
        PrefValue::String(s) if s.trim().is_empty() => PrefValue::Null,
        PrefValue::String(s) => PrefValue::Float(leading_float(s)),
        PrefValue::List(_) | PrefValue::Null => PrefValue::Null,
    }
}

fn cast_string(value: &PrefValue) -> PrefValue {
    match value {
        PrefValue::String(s) => PrefValue::String(s.clone()),
        PrefValue::Boolean(b) => PrefValue::String(b.to_string()),
        PrefValue::Integer(i) => PrefValue::String(i.to_string()),
        PrefValue::Float(f) => PrefValue::String(f.to_string()),
        PrefValue::List(_) | PrefValue::Null => PrefValue::Null,
    }
}

/// Length of an optional sign followed by ASCII digits at the start of `s`
fn sign_and_digits(s: &str) -> (usize, usize) {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    (end, end - digits_start)
}

/// Parse the leading `[+-]?digits` prefix, 0 when there is none
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (end, digits) = sign_and_digits(s);
    if digits == 0 {
        return 0;
    }
    let negative = s.starts_with('-');
    s[..end]
        .parse()
        .unwrap_or(if negative { i64::MIN } else { i64::MAX })
}

/// Parse the leading decimal prefix, 0.0 when there is none
fn leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let (mut end, mut digits) = sign_and_digits(s);

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if frac_digits > 0 || digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let (exp_len, exp_digits) = sign_and_digits(&s[end + 1..]);
        if exp_digits > 0 {
            end += 1 + exp_len;
        }
    }

    s[..end].trim_end_matches('.').parse().unwrap_or(0.0)
}

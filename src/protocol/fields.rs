//! Field-level conversion between wire values and typed message fields.
//!
//! Each field type knows how to take itself off the wire, put itself back,
//! and whether it counts as empty for trailing-field omission. The per-kind
//! functions generated in `messages` call [`decode_field`] and
//! [`encode_field`] once per declared field.

use super::binary::{BinaryData, marked_string};
use super::kind::MessageKind;
use super::value::{Dict, List, MAX_SAFE_INTEGER, Value, WireValue};
use crate::error::{Result, WireError};

/// Conversion failure inside a single field, with the path to the offending
/// nested key or index.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldError {
    path: String,
    reason: String,
}

impl FieldError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            reason: reason.into(),
        }
    }

    fn mismatch(expected: &str, raw: &WireValue) -> Self {
        Self::new(format!("expected {expected}, got {}", raw.type_name()))
    }

    fn at_key(mut self, key: &str) -> Self {
        self.path = format!("[{key:?}]{}", self.path);
        self
    }

    fn at_index(mut self, index: usize) -> Self {
        self.path = format!("[{index}]{}", self.path);
        self
    }

    pub(crate) fn into_wire_error(self, kind: MessageKind, field: &str) -> WireError {
        let mut label = match kind.fields().iter().position(|f| *f == field) {
            Some(index) => format!("{field} (position {})", index + 1),
            None => field.to_string(),
        };
        if !self.path.is_empty() {
            label.push_str(" at ");
            label.push_str(&self.path);
        }
        WireError::MessageFormat {
            kind: kind.name(),
            field: label,
            reason: self.reason,
        }
    }
}

/// A type that can occupy a position in a frame.
pub(crate) trait WireField: Sized + Default {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError>;

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError>;

    /// Whether an optional trailing field holding this value may be omitted.
    fn is_empty(&self) -> bool {
        false
    }
}

/// Decode one declared field. A `null` on the wire leaves the default.
pub(crate) fn decode_field<T: WireField>(
    kind: MessageKind,
    field: &str,
    raw: WireValue,
) -> Result<T> {
    if matches!(raw, WireValue::Null) {
        return Ok(T::default());
    }
    T::from_wire(raw).map_err(|e| e.into_wire_error(kind, field))
}

pub(crate) fn encode_field<T: WireField>(
    kind: MessageKind,
    field: &str,
    value: &T,
) -> Result<WireValue> {
    value.to_wire().map_err(|e| e.into_wire_error(kind, field))
}

fn describe(raw: &WireValue) -> String {
    match raw {
        WireValue::BigInt(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.type_name().to_string()),
    }
}

fn safe_integer(raw: &WireValue) -> std::result::Result<i64, FieldError> {
    let out_of_range = || {
        FieldError::new(format!(
            "integer {} exceeds the safe range of +/-2^53",
            describe(raw)
        ))
    };
    match *raw {
        WireValue::Int(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER => Ok(i),
        WireValue::UInt(u) if u <= MAX_SAFE_INTEGER => Ok(u as i64),
        WireValue::Int(_) | WireValue::UInt(_) | WireValue::BigInt(_) => Err(out_of_range()),
        _ => Err(FieldError::mismatch("integer", raw)),
    }
}

impl WireField for u64 {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError> {
        match raw {
            WireValue::Int(_) | WireValue::UInt(_) | WireValue::BigInt(_) => {
                let value = safe_integer(&raw)?;
                u64::try_from(value)
                    .map_err(|_| FieldError::new(format!("id {value} must not be negative")))
            }
            WireValue::Float(_) => raw.as_u64().ok_or_else(|| {
                FieldError::new(format!(
                    "float {} is not a lossless id in 0..=2^53",
                    describe(&raw)
                ))
            }),
            other => Err(FieldError::mismatch("id", &other)),
        }
    }

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError> {
        if *self > MAX_SAFE_INTEGER {
            return Err(FieldError::new(format!("id {self} exceeds 2^53")));
        }
        Ok(WireValue::UInt(*self))
    }
}

impl WireField for String {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError> {
        match raw {
            WireValue::Str(s) => Ok(s),
            // A NUL-prefixed JSON string parsed as bytes; restore its text.
            WireValue::Bytes(b) => Ok(marked_string(&b)),
            other => Err(FieldError::mismatch("string", &other)),
        }
    }

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError> {
        Ok(WireValue::Str(self.clone()))
    }

    fn is_empty(&self) -> bool {
        String::is_empty(self)
    }
}

impl WireField for MessageKind {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError> {
        let code = raw
            .as_u64()
            .ok_or_else(|| FieldError::mismatch("message type", &raw))?;
        MessageKind::from_code(code)
            .ok_or_else(|| FieldError::new(format!("unknown message type {code}")))
    }

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError> {
        Ok(WireValue::UInt(self.code()))
    }
}

impl WireField for Value {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError> {
        Ok(match raw {
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(b),
            WireValue::Int(_) | WireValue::UInt(_) | WireValue::BigInt(_) => {
                Value::Integer(safe_integer(&raw)?)
            }
            WireValue::Float(f) if f.is_finite() => Value::Float(f),
            WireValue::Float(f) => return Err(FieldError::new(format!("non-finite float {f}"))),
            WireValue::Str(s) => Value::String(s),
            WireValue::Bytes(b) => Value::Binary(BinaryData(b)),
            raw @ WireValue::List(_) => Value::List(List::from_wire(raw)?),
            raw @ WireValue::Map(_) => Value::Dict(Dict::from_wire(raw)?),
        })
    }

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError> {
        Ok(match self {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(*b),
            Value::Integer(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER => WireValue::Int(*i),
            Value::Integer(i) => {
                return Err(FieldError::new(format!(
                    "integer {i} exceeds the safe range of +/-2^53"
                )));
            }
            Value::Float(f) if f.is_finite() => WireValue::Float(*f),
            Value::Float(f) => return Err(FieldError::new(format!("non-finite float {f}"))),
            Value::String(s) => WireValue::Str(s.clone()),
            Value::Binary(b) => WireValue::Bytes(b.0.clone()),
            Value::List(items) => items.to_wire()?,
            Value::Dict(dict) => dict.to_wire()?,
        })
    }
}

impl WireField for List {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError> {
        match raw {
            WireValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| Value::from_wire(item).map_err(|e| e.at_index(index)))
                .collect(),
            other => Err(FieldError::mismatch("list", &other)),
        }
    }

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError> {
        self.iter()
            .enumerate()
            .map(|(index, item)| item.to_wire().map_err(|e| e.at_index(index)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(WireValue::List)
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl WireField for Dict {
    fn from_wire(raw: WireValue) -> std::result::Result<Self, FieldError> {
        let pairs = match raw {
            WireValue::Map(pairs) => pairs,
            other => return Err(FieldError::mismatch("dict", &other)),
        };
        let mut dict = Dict::new();
        for (key, value) in pairs {
            let key = match key {
                WireValue::Str(key) => key,
                other => {
                    return Err(FieldError::new(format!(
                        "key '{}' invalid type: expected string, got {}",
                        describe(&other),
                        other.type_name()
                    )));
                }
            };
            let value = Value::from_wire(value).map_err(|e| e.at_key(&key))?;
            dict.insert(key, value);
        }
        Ok(dict)
    }

    fn to_wire(&self) -> std::result::Result<WireValue, FieldError> {
        self.iter()
            .map(|(key, value)| {
                value
                    .to_wire()
                    .map(|v| (WireValue::Str(key.clone()), v))
                    .map_err(|e| e.at_key(key))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(WireValue::Map)
    }

    fn is_empty(&self) -> bool {
        Dict::is_empty(self)
    }
}

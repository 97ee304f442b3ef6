//! Values carried by frames.
//!
//! [`WireValue`] is what a format parser hands back: untyped, lossless, with
//! arbitrary map keys. [`Value`] is the typed payload stored in message
//! fields (dict entries, positional and keyword arguments). The field mapper
//! in `fields` converts between the two.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::binary::{self, BINARY_MARKER, BinaryData};

/// Largest integer magnitude that survives a round trip through an IEEE
/// double, and the upper bound for protocol ids.
pub const MAX_SAFE_INTEGER: u64 = 1 << 53;

/// String-keyed mapping used for Details/Options/Extra and keyword arguments.
pub type Dict = BTreeMap<String, Value>;

/// Positional argument list.
pub type List = Vec<Value>;

/// Untyped value as decoded from a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Integer literal too wide for 64 bits, kept as its decimal text.
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<WireValue>),
    Map(Vec<(WireValue, WireValue)>),
}

impl WireValue {
    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "bool",
            WireValue::Int(_) | WireValue::UInt(_) | WireValue::BigInt(_) => "integer",
            WireValue::Float(_) => "float",
            WireValue::Str(_) => "string",
            WireValue::Bytes(_) => "binary",
            WireValue::List(_) => "list",
            WireValue::Map(_) => "dict",
        }
    }

    /// Unsigned integral view of the value, if one exists without loss.
    ///
    /// Integral floats are accepted since some textual decoders produce
    /// doubles for every number.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            WireValue::UInt(u) => Some(u),
            WireValue::Int(i) => u64::try_from(i).ok(),
            WireValue::Float(f)
                if f.is_finite()
                    && f.fract() == 0.0
                    && (0.0..=MAX_SAFE_INTEGER as f64).contains(&f) =>
            {
                Some(f as u64)
            }
            _ => None,
        }
    }

    /// Lift a parsed JSON document into a wire value.
    ///
    /// Numbers keep the kind of token they were written as: integer
    /// literals become `UInt`, `Int` or, past 64 bits, `BigInt`; anything
    /// with a fraction or exponent becomes `Float`. Strings carrying the
    /// binary marker and valid base64 become `Bytes`. Object keys stay
    /// strings.
    pub fn from_json(value: serde_json::Value) -> WireValue {
        match value {
            serde_json::Value::Null => WireValue::Null,
            serde_json::Value::Bool(b) => WireValue::Bool(b),
            serde_json::Value::Number(n) => json_number(&n),
            serde_json::Value::String(s) => json_string(s),
            serde_json::Value::Array(items) => {
                WireValue::List(items.into_iter().map(WireValue::from_json).collect())
            }
            serde_json::Value::Object(map) => WireValue::Map(
                map.into_iter()
                    .map(|(k, v)| (WireValue::Str(k), WireValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

// Relies on serde_json's arbitrary_precision, which keeps the literal text.
fn json_number(n: &serde_json::Number) -> WireValue {
    if let Some(u) = n.as_u64() {
        return WireValue::UInt(u);
    }
    if let Some(i) = n.as_i64() {
        return WireValue::Int(i);
    }
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        WireValue::BigInt(text)
    } else {
        // as_f64 is None when the literal overflows a double.
        WireValue::Float(n.as_f64().unwrap_or(f64::INFINITY))
    }
}

fn json_string(s: String) -> WireValue {
    // A marked string with a broken base64 tail stays text.
    if s.starts_with(BINARY_MARKER) {
        if let Ok(data) = BinaryData::from_marked_str(&s) {
            return WireValue::Bytes(data.into_inner());
        }
    }
    WireValue::Str(s)
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Null => serializer.serialize_unit(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Int(i) => serializer.serialize_i64(*i),
            WireValue::UInt(u) => serializer.serialize_u64(*u),
            // Never produced by encoding; written as text so nothing is lost.
            WireValue::BigInt(text) => serializer.serialize_str(text),
            WireValue::Float(f) => serializer.serialize_f64(*f),
            WireValue::Str(s) => serializer.serialize_str(s),
            WireValue::Bytes(b) => binary::serialize_bytes(b, serializer),
            WireValue::List(items) => serializer.collect_seq(items),
            WireValue::Map(pairs) => serializer.collect_map(pairs.iter().map(|(k, v)| (k, v))),
        }
    }
}

/// Decoding from self-describing binary formats. JSON frames go through
/// [`WireValue::from_json`] so integer literals keep their exact value.
impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireValueVisitor)
    }
}

struct WireValueVisitor;

impl<'de> Visitor<'de> for WireValueVisitor {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any wire value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<WireValue, E> {
        Ok(WireValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<WireValue, E> {
        Ok(WireValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireValue, D::Error> {
        WireValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<WireValue, E> {
        Ok(WireValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireValue, E> {
        Ok(WireValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireValue, E> {
        Ok(WireValue::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<WireValue, E> {
        Ok(WireValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<WireValue, E> {
        Ok(WireValue::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<WireValue, E> {
        Ok(WireValue::Str(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<WireValue, E> {
        Ok(WireValue::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<WireValue, E> {
        Ok(WireValue::Bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(WireValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<WireValue, A::Error> {
        let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0).min(1024));
        while let Some(entry) = map.next_entry()? {
            pairs.push(entry);
        }
        Ok(WireValue::Map(pairs))
    }
}

/// Typed payload value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Binary(BinaryData),
    List(List),
    Dict(Dict),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Integer(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<BinaryData> for Value {
    fn from(v: BinaryData) -> Self {
        Value::Binary(v)
    }
}

impl From<List> for Value {
    fn from(v: List) -> Self {
        Value::List(v)
    }
}

impl From<Dict> for Value {
    fn from(v: Dict) -> Self {
        Value::Dict(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_json(text: &str) -> WireValue {
        WireValue::from_json(serde_json::from_str(text).unwrap())
    }

    #[test]
    fn test_json_parse_keeps_integer_signedness() {
        let raw = parse_json("[1, -2, 3.5, 9007199254740993, 33.0]");
        assert_eq!(
            raw,
            WireValue::List(vec![
                WireValue::UInt(1),
                WireValue::Int(-2),
                WireValue::Float(3.5),
                WireValue::UInt(9_007_199_254_740_993),
                WireValue::Float(33.0),
            ])
        );
    }

    #[test]
    fn test_json_wide_integers_are_not_rounded() {
        let raw = parse_json("[18446744073709551617, -9223372036854775809, 1.5e3, 2e19]");
        assert_eq!(
            raw,
            WireValue::List(vec![
                WireValue::BigInt("18446744073709551617".into()),
                WireValue::BigInt("-9223372036854775809".into()),
                WireValue::Float(1500.0),
                WireValue::Float(2e19),
            ])
        );
        assert_eq!(WireValue::BigInt("18446744073709551617".into()).as_u64(), None);
    }

    #[test]
    fn test_json_marked_string_becomes_bytes() {
        let raw = parse_json(r#"["\u0000aGVsbG8=", "aGVsbG8=", "\u0000???"]"#);
        assert_eq!(
            raw,
            WireValue::List(vec![
                WireValue::Bytes(b"hello".to_vec()),
                WireValue::Str("aGVsbG8=".into()),
                WireValue::Str("\0???".into()),
            ])
        );
    }

    #[test]
    fn test_msgpack_keeps_non_string_keys() {
        let raw = WireValue::Map(vec![(WireValue::UInt(1), WireValue::Str("one".into()))]);
        let packed = rmp_serde::to_vec(&raw).unwrap();
        let back: WireValue = rmp_serde::from_slice(&packed).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_msgpack_bytes_are_native() {
        let raw = WireValue::List(vec![WireValue::Bytes(vec![0, 159, 146, 150])]);
        let packed = rmp_serde::to_vec(&raw).unwrap();
        assert_eq!(packed, vec![0x91, 0xc4, 4, 0, 159, 146, 150]);
        let back: WireValue = rmp_serde::from_slice(&packed).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_as_u64_is_lossless() {
        assert_eq!(WireValue::UInt(7).as_u64(), Some(7));
        assert_eq!(WireValue::Int(7).as_u64(), Some(7));
        assert_eq!(WireValue::Int(-7).as_u64(), None);
        assert_eq!(WireValue::Float(7.0).as_u64(), Some(7));
        assert_eq!(WireValue::Float(7.5).as_u64(), None);
        assert_eq!(WireValue::Float(f64::NAN).as_u64(), None);
        assert_eq!(WireValue::Float(1e300).as_u64(), None);
        assert_eq!(WireValue::Str("7".into()).as_u64(), None);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from("a").as_str(), Some("a"));
        assert_eq!(Value::from(3).as_i64(), Some(3));
        assert_eq!(Value::from(3).as_f64(), Some(3.0));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::default().is_null());
        assert_eq!(Value::from(BinaryData::new(vec![1])).as_bytes(), Some(&[1u8][..]));
    }
}

//! [`Value`] — the rich value universe moved by the codec.
//!
//! JSON carries null, booleans, numbers, strings, arrays and string-keyed
//! objects. `Value` adds the kinds JSON cannot express on its own; each of
//! those is written as a tagged wrapper (see [`crate::tag::TypeTag`]).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use regex::Regex;

use crate::tag::TypeTag;

/// Largest integer an IEEE-754 double holds exactly (2^53 - 1).
pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A value that the rich JSON codec knows how to encode and decode.
///
/// Containers preserve insertion order. `Set` and `Map` are order-sensitive
/// sequences rather than hashed collections, so equality is positional.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing / undefined.
    Undefined,
    Null,
    Bool(bool),
    /// Double-precision number. `NaN` is the not-a-number marker; infinities
    /// have no encoding and are written as `null`.
    Number(f64),
    Str(String),
    BigInt(BigInt),
    KvU64(KvU64),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    /// String-keyed members in insertion order. Keys are expected to be
    /// unique; if a key repeats, only its first member is encoded.
    Object(Vec<(String, Value)>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Pattern(Pattern),
    Error(ErrorRecord),
    TypedArray(TypedArray),
    /// Raw byte buffer.
    Buffer(Vec<u8>),
    /// Windowed view over a byte buffer. Only the window is encoded.
    View(Bytes),
}

impl Value {
    /// Build an object from key/value pairs, keeping their order. A repeated
    /// key keeps its first value.
    pub fn object<K, I>(pairs: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut members: Vec<(String, Value)> = Vec::new();
        for (k, v) in pairs {
            let k = k.into();
            if !members.iter().any(|(seen, _)| *seen == k) {
                members.push((k, v));
            }
        }
        Value::Object(members)
    }

    /// The not-a-number predicate.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Look up a key in an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Project onto the plain JSON data model without any tagging.
    ///
    /// Kinds JSON cannot carry become `null`. Undefined object members are
    /// dropped, undefined array elements become `null`.
    pub fn to_plain_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Undefined => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => json_number(*n).unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_plain_json).collect())
            }
            Value::Object(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_plain_json()))
                    .collect(),
            ),
            _ => serde_json::Value::Null,
        }
    }
}

/// Convert a finite double to a JSON number, preferring the integer form for
/// integral values in the safe range. Returns `None` for NaN and infinities.
pub(crate) fn json_number(n: f64) -> Option<serde_json::Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // -0.0 stays a float so the sign survives.
        if n == 0.0 && n.is_sign_negative() {
            return serde_json::Number::from_f64(n).map(serde_json::Value::Number);
        }
        return Some(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(serde_json::Value::Number)
}

impl From<serde_json::Value> for Value {
    /// Plain JSON to `Value`; reserved tag keys are not interpreted.
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(n)
    }
}

impl From<KvU64> for Value {
    fn from(n: KvU64) -> Self {
        Value::KvU64(n)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(p)
    }
}

impl From<ErrorRecord> for Value {
    fn from(e: ErrorRecord) -> Self {
        Value::Error(e)
    }
}

impl From<TypedArray> for Value {
    fn from(a: TypedArray) -> Self {
        Value::TypedArray(a)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::View(b)
    }
}

// ---------------------------------------------------------------- KvU64

/// Opaque unsigned 64-bit counter as stored by a key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KvU64(pub u64);

impl KvU64 {
    pub fn value(self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------- Pattern

/// A compiled pattern. Only its source text travels through the codec.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn source(&self) -> &str {
        self.0.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.0
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern(re)
    }
}

// ---------------------------------------------------------------- ErrorRecord

/// A raised error flattened to its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub message: String,
    /// Error kind, e.g. `"TypeError"` or an application-defined name.
    pub name: String,
    pub stack: Option<String>,
    /// `Some(Undefined)` is written as an absent cause and reads back as `None`.
    pub cause: Option<Box<Value>>,
}

impl ErrorRecord {
    pub const DEFAULT_NAME: &'static str = "Error";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: Self::DEFAULT_NAME.to_string(),
            stack: None,
            cause: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attach a cause. An undefined cause is the same as no cause.
    pub fn with_cause(mut self, cause: Value) -> Self {
        self.cause = (!cause.is_undefined()).then(|| Box::new(cause));
        self
    }
}

// ---------------------------------------------------------------- TypedArray

/// Fixed-width binary arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    /// Byte array whose constructor clamps to `0..=255` instead of wrapping.
    Uint8Clamped(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    BigInt64(Vec<i64>),
    BigUint64(Vec<u64>),
}

impl TypedArray {
    pub fn tag(&self) -> TypeTag {
        match self {
            TypedArray::Int8(_) => TypeTag::Int8Array,
            TypedArray::Uint8(_) => TypeTag::Uint8Array,
            TypedArray::Uint8Clamped(_) => TypeTag::Uint8ClampedArray,
            TypedArray::Int16(_) => TypeTag::Int16Array,
            TypedArray::Uint16(_) => TypeTag::Uint16Array,
            TypedArray::Int32(_) => TypeTag::Int32Array,
            TypedArray::Uint32(_) => TypeTag::Uint32Array,
            TypedArray::Float32(_) => TypeTag::Float32Array,
            TypedArray::Float64(_) => TypeTag::Float64Array,
            TypedArray::BigInt64(_) => TypeTag::BigInt64Array,
            TypedArray::BigUint64(_) => TypeTag::BigUint64Array,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedArray::Int8(v) => v.len(),
            TypedArray::Uint8(v) | TypedArray::Uint8Clamped(v) => v.len(),
            TypedArray::Int16(v) => v.len(),
            TypedArray::Uint16(v) => v.len(),
            TypedArray::Int32(v) => v.len(),
            TypedArray::Uint32(v) => v.len(),
            TypedArray::Float32(v) => v.len(),
            TypedArray::Float64(v) => v.len(),
            TypedArray::BigInt64(v) => v.len(),
            TypedArray::BigUint64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a clamped byte array: NaN becomes 0, values saturate at the
    /// byte bounds and fractions round half to even.
    pub fn uint8_clamped_from(values: &[f64]) -> TypedArray {
        TypedArray::Uint8Clamped(values.iter().map(|&n| clamp_u8(n)).collect())
    }
}

pub(crate) fn clamp_u8(n: f64) -> u8 {
    if n.is_nan() || n <= 0.0 {
        0
    } else if n >= 255.0 {
        255
    } else {
        n.round_ties_even() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_number_prefers_integers_in_safe_range() {
        assert_eq!(json_number(3.0), Some(json!(3)));
        assert_eq!(json_number(-42.0), Some(json!(-42)));
        assert_eq!(json_number(1.5), Some(json!(1.5)));
        assert_eq!(json_number(1e300), Some(json!(1e300)));
        assert_eq!(json_number(f64::NAN), None);
        assert_eq!(json_number(f64::INFINITY), None);
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        let n = json_number(-0.0).unwrap();
        assert!(n.as_f64().unwrap().is_sign_negative());
    }

    #[test]
    fn clamped_constructor_saturates_and_rounds_half_to_even() {
        let arr = TypedArray::uint8_clamped_from(&[-5.0, 0.5, 1.5, 2.5, 254.6, 300.0, f64::NAN]);
        assert_eq!(arr, TypedArray::Uint8Clamped(vec![0, 0, 2, 2, 255, 255, 0]));
    }

    #[test]
    fn plain_projection_drops_rich_kinds() {
        let v = Value::object([
            ("a", Value::from(1)),
            ("b", Value::Undefined),
            ("c", Value::Array(vec![Value::Undefined, Value::BigInt(5.into())])),
            ("d", Value::Number(f64::NAN)),
        ]);
        assert_eq!(v.to_plain_json(), json!({"a": 1, "c": [null, null], "d": null}));
    }

    #[test]
    fn patterns_compare_by_source() {
        let a = Pattern::new("a+b").unwrap();
        let b = Pattern::new("a+b").unwrap();
        let c = Pattern::new("a*b").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn object_constructor_keeps_first_of_repeated_keys() {
        let v = Value::object([
            ("a", Value::from(1)),
            ("b", Value::Null),
            ("a", Value::from(2)),
        ]);
        assert_eq!(
            v,
            Value::Object(vec![("a".into(), Value::from(1)), ("b".into(), Value::Null)])
        );
    }

    #[test]
    fn undefined_cause_is_no_cause() {
        let e = ErrorRecord::new("x").with_cause(Value::Undefined);
        assert_eq!(e.cause, None);
        let e = ErrorRecord::new("x").with_cause(Value::Null);
        assert_eq!(e.cause.as_deref(), Some(&Value::Null));
    }

    #[test]
    fn object_lookup() {
        let v = Value::object([("x", Value::Null), ("y", Value::from(true))]);
        assert_eq!(v.get("y"), Some(&Value::Bool(true)));
        assert_eq!(v.get("z"), None);
        assert_eq!(Value::Null.get("x"), None);
    }
}

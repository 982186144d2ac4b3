//! Decode direction: plain JSON tree back to rich [`Value`].
//!
//! Objects are searched for reserved tag keys in [`TypeTag::DECODE_ORDER`];
//! the first key present selects the reconstruction. Payload children are
//! reconstructed before the value that contains them. The missing marker
//! resolves to [`Value::Undefined`] in place, so arrays keep their length
//! and objects keep their keys.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use num_bigint::BigInt;
use serde_json::Map;
use tracing::trace;

use crate::error::{CodecError, Result};
use crate::normalize::JsonNode;
use crate::tag::TypeTag;
use crate::value::{clamp_u8, ErrorRecord, KvU64, Pattern, TypedArray, Value};

/// Rebuild a value from a JSON tree. Fails on the first malformed payload;
/// no partial value is returned.
pub fn denormalize(node: JsonNode) -> Result<Value> {
    match node {
        JsonNode::Null => Ok(Value::Null),
        JsonNode::Bool(b) => Ok(Value::Bool(b)),
        JsonNode::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN))),
        JsonNode::String(s) => Ok(Value::Str(s)),
        JsonNode::Array(items) => denormalize_all(items).map(Value::Array),
        JsonNode::Object(obj) => denormalize_object(obj),
    }
}

fn denormalize_all(items: Vec<JsonNode>) -> Result<Vec<Value>> {
    items.into_iter().map(denormalize).collect()
}

fn denormalize_object(mut obj: Map<String, JsonNode>) -> Result<Value> {
    let Some(tag) = TypeTag::DECODE_ORDER
        .into_iter()
        .find(|tag| obj.contains_key(tag.as_str()))
    else {
        let pairs = obj
            .into_iter()
            .map(|(k, v)| Ok((k, denormalize(v)?)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Value::Object(pairs));
    };
    let payload = obj.remove(tag.as_str()).unwrap_or(JsonNode::Null);
    trace!(%tag, "reconstructing tagged value");
    reconstruct(tag, payload)
}

fn reconstruct(tag: TypeTag, payload: JsonNode) -> Result<Value> {
    let value = match tag {
        TypeTag::Undefined => Value::Undefined,
        TypeTag::NaN => Value::Number(f64::NAN),
        TypeTag::BigInt => Value::BigInt(big_int(tag, &payload)?),
        TypeTag::KvU64 => {
            let digits = text(tag, &payload)?;
            let n = digits
                .parse::<u64>()
                .map_err(|e| CodecError::malformed(tag, format!("{digits:?}: {e}")))?;
            Value::KvU64(KvU64(n))
        }
        TypeTag::Date => {
            let iso = text(tag, &payload)?;
            let date = parse_instant(iso).ok_or_else(|| {
                CodecError::malformed(tag, format!("{iso:?} is not an ISO instant"))
            })?;
            Value::Date(date)
        }
        TypeTag::Set => Value::Set(denormalize_all(list(tag, payload)?)?),
        TypeTag::Map => {
            let entries = list(tag, payload)?
                .into_iter()
                .enumerate()
                .map(|(i, entry)| map_entry(tag, i, entry))
                .collect::<Result<Vec<_>>>()?;
            Value::Map(entries)
        }
        TypeTag::RegExp => {
            let source = text(tag, &payload)?;
            let pattern =
                Pattern::new(source).map_err(|e| CodecError::malformed(tag, e.to_string()))?;
            Value::Pattern(pattern)
        }
        TypeTag::Error => Value::Error(error_record(tag, payload)?),
        TypeTag::ArrayBuffer => Value::Buffer(byte_elements(tag, payload)?),
        TypeTag::DataView => Value::View(Bytes::from(byte_elements(tag, payload)?)),
        TypeTag::Int8Array
        | TypeTag::Int16Array
        | TypeTag::Int32Array
        | TypeTag::BigInt64Array
        | TypeTag::Uint8Array
        | TypeTag::Uint16Array
        | TypeTag::Uint32Array
        | TypeTag::BigUint64Array
        | TypeTag::Uint8ClampedArray
        | TypeTag::Float32Array
        | TypeTag::Float64Array => Value::TypedArray(typed_array(tag, payload)?),
    };
    Ok(value)
}

// ----------------------------------------------------------------
// Payload shapes

/// RFC 3339 text, or the extended form with a signed year of more than
/// four digits (`+010000-01-01T00:00:00.000Z`, `-000001-...`).
fn parse_instant(iso: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(iso) {
        return Some(date.with_timezone(&Utc));
    }
    if let Some(local) = iso.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f%:z")
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn describe(node: &JsonNode) -> &'static str {
    match node {
        JsonNode::Null => "null",
        JsonNode::Bool(_) => "boolean",
        JsonNode::Number(_) => "number",
        JsonNode::String(_) => "string",
        JsonNode::Array(_) => "array",
        JsonNode::Object(_) => "object",
    }
}

fn text(tag: TypeTag, payload: &JsonNode) -> Result<&str> {
    payload.as_str().ok_or_else(|| {
        CodecError::malformed(tag, format!("expected string, got {}", describe(payload)))
    })
}

fn list(tag: TypeTag, payload: JsonNode) -> Result<Vec<JsonNode>> {
    match payload {
        JsonNode::Array(items) => Ok(items),
        other => Err(CodecError::malformed(
            tag,
            format!("expected array, got {}", describe(&other)),
        )),
    }
}

fn big_int(tag: TypeTag, payload: &JsonNode) -> Result<BigInt> {
    let digits = match payload {
        JsonNode::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => text(tag, payload)?.to_string(),
    };
    digits
        .parse::<BigInt>()
        .map_err(|e| CodecError::malformed(tag, format!("{digits:?}: {e}")))
}

fn map_entry(tag: TypeTag, index: usize, entry: JsonNode) -> Result<(Value, Value)> {
    match entry {
        JsonNode::Array(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            let key = denormalize(pair.next().unwrap_or(JsonNode::Null))?;
            let value = denormalize(pair.next().unwrap_or(JsonNode::Null))?;
            Ok((key, value))
        }
        other => Err(CodecError::malformed(
            tag,
            format!("entry {index} is not a [key, value] pair ({})", describe(&other)),
        )),
    }
}

fn error_record(tag: TypeTag, payload: JsonNode) -> Result<ErrorRecord> {
    let mut fields = match payload {
        JsonNode::Object(fields) => fields,
        other => {
            return Err(CodecError::malformed(
                tag,
                format!("expected object, got {}", describe(&other)),
            ))
        }
    };
    let mut string_field = |name: &str| -> Result<Option<String>> {
        match fields.remove(name) {
            None | Some(JsonNode::Null) => Ok(None),
            Some(JsonNode::String(s)) => Ok(Some(s)),
            Some(other) => Err(CodecError::malformed(
                tag,
                format!("field {name:?} must be a string, got {}", describe(&other)),
            )),
        }
    };
    let message = string_field("message")?.unwrap_or_default();
    let name = string_field("name")?.unwrap_or_else(|| ErrorRecord::DEFAULT_NAME.to_string());
    let stack = string_field("stack")?;
    // The cause is plain JSON on the wire; tags inside it are not interpreted.
    let cause = fields.remove("cause").map(|c| Box::new(Value::from(c)));
    Ok(ErrorRecord {
        message,
        name,
        stack,
        cause,
    })
}

// ----------------------------------------------------------------
// Binary payloads

fn typed_array(tag: TypeTag, payload: JsonNode) -> Result<TypedArray> {
    let items = list(tag, payload)?;
    let array = match tag {
        TypeTag::Int8Array => TypedArray::Int8(integer_elements(tag, &items)?),
        TypeTag::Uint8Array => TypedArray::Uint8(integer_elements(tag, &items)?),
        TypeTag::Int16Array => TypedArray::Int16(integer_elements(tag, &items)?),
        TypeTag::Uint16Array => TypedArray::Uint16(integer_elements(tag, &items)?),
        TypeTag::Int32Array => TypedArray::Int32(integer_elements(tag, &items)?),
        TypeTag::Uint32Array => TypedArray::Uint32(integer_elements(tag, &items)?),
        TypeTag::BigInt64Array => TypedArray::BigInt64(wide_elements(tag, &items)?),
        TypeTag::BigUint64Array => TypedArray::BigUint64(wide_elements(tag, &items)?),
        TypeTag::Uint8ClampedArray => {
            let values = float_elements(tag, &items)?;
            TypedArray::Uint8Clamped(values.into_iter().map(clamp_u8).collect())
        }
        TypeTag::Float32Array => TypedArray::Float32(
            float_elements(tag, &items)?
                .into_iter()
                .map(|x| x as f32)
                .collect(),
        ),
        TypeTag::Float64Array => TypedArray::Float64(float_elements(tag, &items)?),
        _ => return Err(CodecError::malformed(tag, "not a typed array tag")),
    };
    Ok(array)
}

fn byte_elements(tag: TypeTag, payload: JsonNode) -> Result<Vec<u8>> {
    integer_elements(tag, &list(tag, payload)?)
}

/// An integral JSON number, accepting `1.0`-style spellings.
fn element_i64(node: &JsonNode) -> Option<i64> {
    let JsonNode::Number(n) = node else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

fn integer_elements<T: TryFrom<i64>>(tag: TypeTag, items: &[JsonNode]) -> Result<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let n = element_i64(item).ok_or_else(|| {
                CodecError::malformed(
                    tag,
                    format!("element {i} is not an integer ({})", describe(item)),
                )
            })?;
            T::try_from(n)
                .map_err(|_| CodecError::malformed(tag, format!("element {i} = {n} is out of range")))
        })
        .collect()
}

/// 64-bit elements arrive as `{"__bigint__": "..."}` wrappers or, when
/// written by hand, as plain integers.
fn wide_elements<T>(tag: TypeTag, items: &[JsonNode]) -> Result<Vec<T>>
where
    T: for<'a> TryFrom<&'a BigInt>,
{
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let big = match item {
                JsonNode::Object(obj) => match obj.get(TypeTag::BigInt.as_str()) {
                    Some(digits) => big_int(tag, digits)?,
                    None => {
                        return Err(CodecError::malformed(
                            tag,
                            format!("element {i} is an object without {}", TypeTag::BigInt),
                        ))
                    }
                },
                other => big_int(tag, other)?,
            };
            T::try_from(&big)
                .map_err(|_| CodecError::malformed(tag, format!("element {i} = {big} is out of range")))
        })
        .collect()
}

/// Float elements: numbers, `{"__nan__": ..}` markers, and `null` (the
/// JSON spelling of an infinity) which reads as zero.
fn float_elements(tag: TypeTag, items: &[JsonNode]) -> Result<Vec<f64>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            JsonNode::Number(n) => Ok(n.as_f64().unwrap_or(f64::NAN)),
            JsonNode::Null => Ok(0.0),
            JsonNode::Object(obj) if obj.contains_key(TypeTag::NaN.as_str()) => Ok(f64::NAN),
            other => Err(CodecError::malformed(
                tag,
                format!("element {i} is not a number ({})", describe(other)),
            )),
        })
        .collect()
}

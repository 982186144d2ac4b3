//! Encode direction: rich [`Value`] to a plain JSON tree.
//!
//! The walk is explicit and uniform: every node, including the members of
//! plain arrays and objects, goes through [`normalize`]. Kinds JSON cannot
//! carry come out as single-key tagged wrappers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Map;

use crate::tag::TypeTag;
use crate::value::{json_number, ErrorRecord, TypedArray, Value};

/// Plain JSON tree produced by [`normalize`] and consumed by
/// [`crate::denormalize`].
pub type JsonNode = serde_json::Value;

/// Placeholder payload for tags where only the key matters.
const MARKER: JsonNode = JsonNode::Bool(false);

/// Map a value onto the JSON data model. Total and infallible.
pub fn normalize(value: &Value) -> JsonNode {
    match value {
        Value::Null => JsonNode::Null,
        Value::Bool(b) => JsonNode::Bool(*b),
        Value::Str(s) => JsonNode::String(s.clone()),
        Value::Number(n) => normalize_number(*n),
        Value::Undefined => tagged(TypeTag::Undefined, MARKER),
        Value::BigInt(n) => tagged(TypeTag::BigInt, JsonNode::String(n.to_string())),
        Value::KvU64(n) => tagged(TypeTag::KvU64, JsonNode::String(n.value().to_string())),
        Value::Date(d) => tagged(TypeTag::Date, JsonNode::String(iso_text(d))),
        Value::Set(items) => tagged(
            TypeTag::Set,
            JsonNode::Array(items.iter().map(normalize).collect()),
        ),
        Value::Map(entries) => tagged(
            TypeTag::Map,
            JsonNode::Array(
                entries
                    .iter()
                    .map(|(k, v)| JsonNode::Array(vec![normalize(k), normalize(v)]))
                    .collect(),
            ),
        ),
        Value::Pattern(p) => tagged(TypeTag::RegExp, JsonNode::String(p.source().to_string())),
        Value::Error(e) => tagged(TypeTag::Error, error_payload(e)),
        Value::TypedArray(arr) => tagged(arr.tag(), typed_array_payload(arr)),
        Value::Buffer(buf) => tagged(TypeTag::ArrayBuffer, byte_payload(buf)),
        Value::View(view) => tagged(TypeTag::DataView, byte_payload(view)),
        Value::Array(items) => JsonNode::Array(items.iter().map(normalize).collect()),
        Value::Object(pairs) => {
            let mut obj = Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                if !obj.contains_key(k) {
                    obj.insert(k.clone(), normalize(v));
                }
            }
            JsonNode::Object(obj)
        }
    }
}

fn tagged(tag: TypeTag, payload: JsonNode) -> JsonNode {
    let mut obj = Map::with_capacity(1);
    obj.insert(tag.as_str().to_string(), payload);
    JsonNode::Object(obj)
}

fn normalize_number(n: f64) -> JsonNode {
    if n.is_nan() {
        return tagged(TypeTag::NaN, MARKER);
    }
    // Infinities have no JSON form and no tag; they degrade to null.
    json_number(n).unwrap_or(JsonNode::Null)
}

/// ISO-8601 text for an instant: millisecond precision when that is
/// lossless, otherwise as many fractional digits as needed.
pub(crate) fn iso_text(d: &DateTime<Utc>) -> String {
    let format = if d.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else {
        SecondsFormat::AutoSi
    };
    d.to_rfc3339_opts(format, true)
}

/// `{"message", "name", "stack"?, "cause"?}`. The cause is written as its
/// plain JSON projection, not normalized.
fn error_payload(e: &ErrorRecord) -> JsonNode {
    let mut obj = Map::new();
    obj.insert("message".to_string(), JsonNode::String(e.message.clone()));
    obj.insert("name".to_string(), JsonNode::String(e.name.clone()));
    if let Some(stack) = &e.stack {
        obj.insert("stack".to_string(), JsonNode::String(stack.clone()));
    }
    if let Some(cause) = e.cause.as_deref().filter(|c| !c.is_undefined()) {
        obj.insert("cause".to_string(), cause.to_plain_json());
    }
    JsonNode::Object(obj)
}

fn typed_array_payload(arr: &TypedArray) -> JsonNode {
    let items: Vec<JsonNode> = match arr {
        TypedArray::Int8(v) => v.iter().map(|&x| JsonNode::from(x)).collect(),
        TypedArray::Uint8(v) | TypedArray::Uint8Clamped(v) => {
            v.iter().map(|&x| JsonNode::from(x)).collect()
        }
        TypedArray::Int16(v) => v.iter().map(|&x| JsonNode::from(x)).collect(),
        TypedArray::Uint16(v) => v.iter().map(|&x| JsonNode::from(x)).collect(),
        TypedArray::Int32(v) => v.iter().map(|&x| JsonNode::from(x)).collect(),
        TypedArray::Uint32(v) => v.iter().map(|&x| JsonNode::from(x)).collect(),
        TypedArray::Float32(v) => v.iter().map(|&x| normalize_number(x as f64)).collect(),
        TypedArray::Float64(v) => v.iter().map(|&x| normalize_number(x)).collect(),
        // 64-bit elements exceed double precision; each travels as a big integer.
        TypedArray::BigInt64(v) => v
            .iter()
            .map(|x| tagged(TypeTag::BigInt, JsonNode::String(x.to_string())))
            .collect(),
        TypedArray::BigUint64(v) => v
            .iter()
            .map(|x| tagged(TypeTag::BigInt, JsonNode::String(x.to_string())))
            .collect(),
    };
    JsonNode::Array(items)
}

fn byte_payload(bytes: &[u8]) -> JsonNode {
    JsonNode::Array(bytes.iter().map(|&b| JsonNode::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{KvU64, Pattern};
    use bytes::Bytes;
    use chrono::TimeZone;
    use num_bigint::BigInt;
    use serde_json::json;

    #[test]
    fn natives_pass_through() {
        assert_eq!(normalize(&Value::Null), json!(null));
        assert_eq!(normalize(&Value::Bool(true)), json!(true));
        assert_eq!(normalize(&Value::from("hi")), json!("hi"));
        assert_eq!(normalize(&Value::from(7)), json!(7));
        assert_eq!(normalize(&Value::from(0.25)), json!(0.25));
    }

    #[test]
    fn markers_use_false_placeholder() {
        assert_eq!(normalize(&Value::Undefined), json!({"__undefined__": false}));
        assert_eq!(normalize(&Value::Number(f64::NAN)), json!({"__nan__": false}));
    }

    #[test]
    fn infinities_degrade_to_null() {
        assert_eq!(normalize(&Value::Number(f64::INFINITY)), json!(null));
        assert_eq!(normalize(&Value::Number(f64::NEG_INFINITY)), json!(null));
    }

    #[test]
    fn integers_travel_as_decimal_text() {
        let big: BigInt = "-123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            normalize(&Value::BigInt(big)),
            json!({"__bigint__": "-123456789012345678901234567890"})
        );
        assert_eq!(
            normalize(&Value::KvU64(KvU64(u64::MAX))),
            json!({"__kvu64__": "18446744073709551615"})
        );
    }

    #[test]
    fn dates_use_millisecond_iso_text() {
        let d = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 9).unwrap();
        assert_eq!(
            normalize(&Value::Date(d)),
            json!({"__date__": "2024-02-29T13:05:09.000Z"})
        );
        let precise = d + chrono::Duration::nanoseconds(1_500);
        assert_eq!(
            normalize(&Value::Date(precise)),
            json!({"__date__": "2024-02-29T13:05:09.000001500Z"})
        );
    }

    #[test]
    fn map_keys_are_normalized_by_the_same_walk() {
        let d = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let v = Value::Map(vec![
            (Value::Date(d), Value::from(1)),
            (Value::from("k"), Value::Undefined),
        ]);
        assert_eq!(
            normalize(&v),
            json!({"__map__": [
                [{"__date__": "2000-01-01T00:00:00.000Z"}, 1],
                ["k", {"__undefined__": false}]
            ]})
        );
    }

    #[test]
    fn plain_containers_are_walked_to_full_depth() {
        let d = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let v = Value::object([(
            "outer",
            Value::object([("inner", Value::Array(vec![Value::Date(d), Value::Set(vec![])]))]),
        )]);
        assert_eq!(
            normalize(&v),
            json!({"outer": {"inner": [{"__date__": "2000-01-01T00:00:00.000Z"}, {"__set__": []}]}})
        );
    }

    #[test]
    fn repeated_object_keys_keep_the_first_member() {
        let v = Value::Object(vec![
            ("a".into(), Value::from(1)),
            ("b".into(), Value::from(2)),
            ("a".into(), Value::Set(vec![])),
        ]);
        assert_eq!(normalize(&v), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn undefined_cause_is_written_as_absent() {
        let mut e = ErrorRecord::new("boom");
        e.cause = Some(Box::new(Value::Undefined));
        assert_eq!(
            normalize(&Value::Error(e)),
            json!({"__error__": {"message": "boom", "name": "Error"}})
        );
    }

    #[test]
    fn error_cause_is_projected_not_normalized() {
        let e = ErrorRecord::new("boom")
            .with_name("ValidationError")
            .with_cause(Value::object([
                ("code", Value::from(4)),
                ("when", Value::BigInt(1.into())),
            ]));
        assert_eq!(
            normalize(&Value::Error(e)),
            json!({"__error__": {
                "message": "boom",
                "name": "ValidationError",
                "cause": {"code": 4, "when": null}
            }})
        );
    }

    #[test]
    fn pattern_keeps_source_only() {
        let p = Pattern::new(r"(?i)^a\d+$").unwrap();
        assert_eq!(normalize(&Value::Pattern(p)), json!({"__regexp__": r"(?i)^a\d+$"}));
    }

    #[test]
    fn wide_and_float_elements() {
        let wide = TypedArray::BigUint64(vec![0, u64::MAX]);
        assert_eq!(
            normalize(&Value::TypedArray(wide)),
            json!({"__biguint64array__": [{"__bigint__": "0"}, {"__bigint__": "18446744073709551615"}]})
        );
        let floats = TypedArray::Float64(vec![1.5, f64::NAN, f64::INFINITY]);
        assert_eq!(
            normalize(&Value::TypedArray(floats)),
            json!({"__float64array__": [1.5, {"__nan__": false}, null]})
        );
    }

    #[test]
    fn view_contributes_only_its_window() {
        let backing = Bytes::from_static(&[9, 8, 7, 6, 5]);
        let view = backing.slice(1..3);
        assert_eq!(normalize(&Value::View(view)), json!({"__dataview__": [8, 7]}));
        assert_eq!(
            normalize(&Value::Buffer(vec![0, 255])),
            json!({"__arraybuffer__": [0, 255]})
        );
    }
}

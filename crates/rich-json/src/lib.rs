//! Lossless JSON encoding for values richer than the JSON data model.
//!
//! Kinds JSON cannot carry (undefined, NaN, big integers, key-value counters,
//! dates, sets, ordered maps, patterns, errors, typed arrays, buffers and
//! views) are written as single-key tagged wrappers such as
//! `{"__date__":"2024-01-01T00:00:00.000Z"}` and rebuilt on decode.
//!
//! # Example
//!
//! ```
//! use rich_json::{decode_from_text, encode_to_text, Value};
//!
//! let value = Value::object([
//!     ("ids", Value::Set(vec![Value::from(3), Value::from(1), Value::from(2)])),
//!     ("missing", Value::Undefined),
//! ]);
//! let text = encode_to_text(&value).unwrap();
//! assert_eq!(
//!     text,
//!     r#"{"ids":{"__set__":[3,1,2]},"missing":{"__undefined__":false}}"#
//! );
//! assert_eq!(decode_from_text(&text).unwrap(), value);
//! ```
//!
//! A plain object that happens to use a reserved key is indistinguishable
//! from a tagged wrapper and decodes as the tagged kind.

pub mod codec;
pub mod denormalize;
pub mod error;
pub mod normalize;
pub mod options;
pub mod tag;
pub mod value;

pub use codec::RichJsonCodec;
pub use denormalize::denormalize;
pub use error::{CodecError, Result};
pub use normalize::{normalize, JsonNode};
pub use options::CodecOptions;
pub use tag::TypeTag;
pub use value::{ErrorRecord, KvU64, Pattern, TypedArray, Value};

/// Encode a value to compact JSON text.
pub fn encode_to_text(value: &Value) -> Result<String> {
    RichJsonCodec::new().encode_to_text(value)
}

/// Decode JSON text, rebuilding tagged values.
pub fn decode_from_text(text: &str) -> Result<Value> {
    RichJsonCodec::new().decode_from_text(text)
}

/// Encode a value to UTF-8 JSON bytes.
pub fn serialize_to_bytes(value: &Value) -> Result<Vec<u8>> {
    RichJsonCodec::new().serialize_to_bytes(value)
}

/// Decode UTF-8 JSON bytes.
pub fn deserialize_from_bytes(bytes: &[u8]) -> Result<Value> {
    RichJsonCodec::new().deserialize_from_bytes(bytes)
}

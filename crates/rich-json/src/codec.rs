//! [`RichJsonCodec`] — text and byte entry points.
//!
//! Encoding is `normalize` followed by the `serde_json` writer; decoding is
//! the `serde_json` parser followed by `denormalize`. Bytes are UTF-8 text.

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::denormalize::denormalize;
use crate::error::{CodecError, Result};
use crate::normalize::{normalize, JsonNode};
use crate::options::CodecOptions;
use crate::value::Value;

/// Stateless codec carrying only its layout options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichJsonCodec {
    pub options: CodecOptions,
}

impl RichJsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }

    /// Codec that writes indented JSON.
    pub fn pretty(indent: usize) -> Self {
        Self::with_options(CodecOptions::pretty(indent))
    }

    pub fn encode_to_text(&self, value: &Value) -> Result<String> {
        let node = normalize(value);
        let out = self.write(&node)?;
        let text = String::from_utf8(out).map_err(|e| CodecError::InvalidUtf8 {
            position: e.utf8_error().valid_up_to(),
        })?;
        debug!(len = text.len(), "encoded rich value");
        Ok(text)
    }

    pub fn decode_from_text(&self, text: &str) -> Result<Value> {
        debug!(len = text.len(), "decoding rich value");
        // Nesting depth is bounded only by the stack, same as encode.
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let node = JsonNode::deserialize(&mut de).map_err(CodecError::Parse)?;
        de.end().map_err(CodecError::Parse)?;
        denormalize(node)
    }

    pub fn serialize_to_bytes(&self, value: &Value) -> Result<Vec<u8>> {
        self.encode_to_text(value).map(String::into_bytes)
    }

    pub fn deserialize_from_bytes(&self, bytes: &[u8]) -> Result<Value> {
        let text = std::str::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8 {
            position: e.valid_up_to(),
        })?;
        self.decode_from_text(text)
    }

    fn write(&self, node: &JsonNode) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self.options.effective_indent() {
            None => serde_json::to_writer(&mut out, node).map_err(CodecError::Write)?,
            Some(width) => {
                let indent = vec![b' '; width];
                let mut ser =
                    Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
                node.serialize(&mut ser).map_err(CodecError::Write)?;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::KvU64;

    #[test]
    fn compact_output_has_no_whitespace() {
        let codec = RichJsonCodec::new();
        let v = Value::object([("a", Value::Set(vec![Value::from(1)]))]);
        assert_eq!(codec.encode_to_text(&v).unwrap(), r#"{"a":{"__set__":[1]}}"#);
    }

    #[test]
    fn pretty_output_uses_requested_indent() {
        let codec = RichJsonCodec::pretty(4);
        let v = Value::object([("n", Value::KvU64(KvU64(3)))]);
        assert_eq!(
            codec.encode_to_text(&v).unwrap(),
            "{\n    \"n\": {\n        \"__kvu64__\": \"3\"\n    }\n}"
        );
    }

    #[test]
    fn pretty_text_decodes_like_compact_text() {
        let v = Value::Array(vec![Value::Undefined, Value::Number(f64::NAN), Value::from("x")]);
        let pretty = RichJsonCodec::pretty(2).encode_to_text(&v).unwrap();
        let back = RichJsonCodec::new().decode_from_text(&pretty).unwrap();
        let Value::Array(items) = back else {
            panic!("expected array")
        };
        assert_eq!(items[0], Value::Undefined);
        assert!(items[1].is_nan());
        assert_eq!(items[2], Value::from("x"));
    }

    #[test]
    fn invalid_utf8_reports_position() {
        let err = RichJsonCodec::new()
            .deserialize_from_bytes(b"\"ab\xff\"")
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8 { position: 3 }));
    }

    #[test]
    fn nesting_deeper_than_the_parser_default_decodes() {
        let mut v = Value::from(1);
        for _ in 0..200 {
            v = Value::Set(vec![v]);
        }
        let codec = RichJsonCodec::new();
        let text = codec.encode_to_text(&v).unwrap();
        assert_eq!(codec.decode_from_text(&text).unwrap(), v);
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = RichJsonCodec::new().decode_from_text("[1] [2]").unwrap_err();
        assert!(matches!(err, CodecError::Parse(_)));
    }

    #[test]
    fn parse_errors_are_propagated() {
        let err = RichJsonCodec::new().decode_from_text("{\"a\":").unwrap_err();
        assert!(matches!(err, CodecError::Parse(_)));
        assert_eq!(err.tag(), None);
    }
}

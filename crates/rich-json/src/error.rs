//! Error types for rich JSON encoding and decoding.

use thiserror::Error;

use crate::tag::TypeTag;

#[derive(Error, Debug)]
pub enum CodecError {
    /// A reserved tag key was present but its payload could not be
    /// reconstructed. Aborts the whole decode.
    #[error("Invalid {tag} payload: {reason}")]
    MalformedTagPayload { tag: TypeTag, reason: String },

    /// Input text is not well-formed JSON.
    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Input bytes are not valid UTF-8.
    #[error("Invalid UTF-8 at byte {position}")]
    InvalidUtf8 { position: usize },

    #[error("Failed to write JSON: {0}")]
    Write(#[source] serde_json::Error),
}

impl CodecError {
    pub(crate) fn malformed(tag: TypeTag, reason: impl Into<String>) -> Self {
        CodecError::MalformedTagPayload {
            tag,
            reason: reason.into(),
        }
    }

    /// The tag whose payload failed to decode, if any.
    pub fn tag(&self) -> Option<TypeTag> {
        match self {
            CodecError::MalformedTagPayload { tag, .. } => Some(*tag),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

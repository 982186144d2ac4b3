//! Reserved tag keys used to wrap values that JSON cannot carry natively.
//!
//! Every tagged wrapper is a single-key object `{"<tag>": <payload>}`. The
//! vocabulary is closed: the decoder understands exactly these keys and no
//! versioning is attempted.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Undefined,
    NaN,
    BigInt,
    KvU64,
    Date,
    Set,
    Map,
    RegExp,
    Error,
    Int8Array,
    Int16Array,
    Int32Array,
    BigInt64Array,
    Uint8Array,
    Uint16Array,
    Uint32Array,
    BigUint64Array,
    Uint8ClampedArray,
    Float32Array,
    Float64Array,
    ArrayBuffer,
    DataView,
}

impl TypeTag {
    /// Tags in the order the decoder looks for them in an object.
    ///
    /// `Undefined` comes last: an object carrying both the missing marker and
    /// another tag resolves to the other kind.
    pub const DECODE_ORDER: [TypeTag; 22] = [
        TypeTag::NaN,
        TypeTag::BigInt,
        TypeTag::KvU64,
        TypeTag::Date,
        TypeTag::Set,
        TypeTag::Map,
        TypeTag::RegExp,
        TypeTag::Error,
        TypeTag::Int8Array,
        TypeTag::Int16Array,
        TypeTag::Int32Array,
        TypeTag::BigInt64Array,
        TypeTag::Uint8Array,
        TypeTag::Uint16Array,
        TypeTag::Uint32Array,
        TypeTag::BigUint64Array,
        TypeTag::Uint8ClampedArray,
        TypeTag::Float32Array,
        TypeTag::Float64Array,
        TypeTag::ArrayBuffer,
        TypeTag::DataView,
        TypeTag::Undefined,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TypeTag::Undefined => "__undefined__",
            TypeTag::NaN => "__nan__",
            TypeTag::BigInt => "__bigint__",
            TypeTag::KvU64 => "__kvu64__",
            TypeTag::Date => "__date__",
            TypeTag::Set => "__set__",
            TypeTag::Map => "__map__",
            TypeTag::RegExp => "__regexp__",
            TypeTag::Error => "__error__",
            TypeTag::Int8Array => "__int8array__",
            TypeTag::Int16Array => "__int16array__",
            TypeTag::Int32Array => "__int32array__",
            TypeTag::BigInt64Array => "__bigint64array__",
            TypeTag::Uint8Array => "__uint8array__",
            TypeTag::Uint16Array => "__uint16array__",
            TypeTag::Uint32Array => "__uint32array__",
            TypeTag::BigUint64Array => "__biguint64array__",
            TypeTag::Uint8ClampedArray => "__uint8clampedarray__",
            TypeTag::Float32Array => "__float32array__",
            TypeTag::Float64Array => "__float64array__",
            TypeTag::ArrayBuffer => "__arraybuffer__",
            TypeTag::DataView => "__dataview__",
        }
    }

    /// Look up the tag for an object key, if the key is reserved.
    pub fn from_key(key: &str) -> Option<TypeTag> {
        TypeTag::DECODE_ORDER
            .iter()
            .copied()
            .find(|tag| tag.as_str() == key)
    }

    /// Whether `key` belongs to the reserved vocabulary.
    pub fn is_reserved(key: &str) -> bool {
        TypeTag::from_key(key).is_some()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Owned values produced by generation and inspected by validation.

use crate::rule::{F32_TOLERANCE, F64_TOLERANCE};
use bytes::BufMut;
use std::fmt;

/// Decoded value of a [crate::Construct].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(u8),
    Octet(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    /// Ordinal of an enumerator.
    Enum(u32),
    /// Elements of a fixed array, flattened in row-major order.
    Array(Vec<Value>),
    Sequence(Vec<Value>),
    Union {
        discriminant: Box<Value>,
        /// Payload of the active case (absent when no case is selected).
        payload: Option<Box<Value>>,
    },
    /// Field values, in declaration order.
    Struct(Vec<Value>),
    Optional(Option<Box<Value>>),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::Octet(_) => "octet",
            Self::I16(_) => "int16",
            Self::U16(_) => "uint16",
            Self::I32(_) => "int32",
            Self::U32(_) => "uint32",
            Self::I64(_) => "int64",
            Self::U64(_) => "uint64",
            Self::F32(_) => "float32",
            Self::F64(_) => "float64",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Sequence(_) => "sequence",
            Self::Union { .. } => "union",
            Self::Struct(_) => "struct",
            Self::Optional(_) => "optional",
        }
    }

    /// Interpret a discriminant value as a union case label.
    pub fn as_label(&self) -> Option<i64> {
        match *self {
            Self::Bool(v) => Some(v as i64),
            Self::Char(v) | Self::Octet(v) => Some(v as i64),
            Self::I16(v) => Some(v as i64),
            Self::U16(v) => Some(v as i64),
            Self::I32(v) => Some(v as i64),
            Self::U32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            Self::U64(v) => i64::try_from(v).ok(),
            Self::Enum(v) => Some(v as i64),
            _ => None,
        }
    }

    /// Child at `index` of a struct, array or sequence.
    pub fn child(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Struct(values) | Self::Array(values) | Self::Sequence(values) => {
                values.get(index)
            }
            _ => None,
        }
    }

    /// Mutable child at `index` of a struct, array or sequence.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Self::Struct(values) | Self::Array(values) | Self::Sequence(values) => {
                values.get_mut(index)
            }
            _ => None,
        }
    }

    /// Returns whether two scalars are equal, comparing floating point values within the
    /// tolerance of their precision.
    ///
    /// Values of different kinds never match.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::F32(a), Self::F32(b)) => a == b || (a - b).abs() <= F32_TOLERANCE,
            (Self::F64(a), Self::F64(b)) => a == b || (a - b).abs() <= F64_TOLERANCE,
            (a, b) => a == b,
        }
    }

    /// Write a deterministic, self-delimiting encoding of the value.
    pub fn write(&self, buf: &mut impl BufMut) {
        match self {
            Self::Bool(v) => {
                buf.put_u8(TAG_BOOL);
                buf.put_u8(*v as u8);
            }
            Self::Char(v) => {
                buf.put_u8(TAG_CHAR);
                buf.put_u8(*v);
            }
            Self::Octet(v) => {
                buf.put_u8(TAG_OCTET);
                buf.put_u8(*v);
            }
            Self::I16(v) => {
                buf.put_u8(TAG_I16);
                buf.put_i16_le(*v);
            }
            Self::U16(v) => {
                buf.put_u8(TAG_U16);
                buf.put_u16_le(*v);
            }
            Self::I32(v) => {
                buf.put_u8(TAG_I32);
                buf.put_i32_le(*v);
            }
            Self::U32(v) => {
                buf.put_u8(TAG_U32);
                buf.put_u32_le(*v);
            }
            Self::I64(v) => {
                buf.put_u8(TAG_I64);
                buf.put_i64_le(*v);
            }
            Self::U64(v) => {
                buf.put_u8(TAG_U64);
                buf.put_u64_le(*v);
            }
            Self::F32(v) => {
                buf.put_u8(TAG_F32);
                buf.put_u32_le(v.to_bits());
            }
            Self::F64(v) => {
                buf.put_u8(TAG_F64);
                buf.put_u64_le(v.to_bits());
            }
            Self::String(v) => {
                buf.put_u8(TAG_STRING);
                buf.put_u64_le(v.len() as u64);
                buf.put_slice(v.as_bytes());
            }
            Self::Enum(v) => {
                buf.put_u8(TAG_ENUM);
                buf.put_u32_le(*v);
            }
            Self::Array(values) => {
                buf.put_u8(TAG_ARRAY);
                write_all(values, buf);
            }
            Self::Sequence(values) => {
                buf.put_u8(TAG_SEQUENCE);
                write_all(values, buf);
            }
            Self::Union {
                discriminant,
                payload,
            } => {
                buf.put_u8(TAG_UNION);
                discriminant.write(buf);
                write_option(payload.as_deref(), buf);
            }
            Self::Struct(values) => {
                buf.put_u8(TAG_STRUCT);
                write_all(values, buf);
            }
            Self::Optional(inner) => {
                buf.put_u8(TAG_OPTIONAL);
                write_option(inner.as_deref(), buf);
            }
        }
    }
}

const TAG_BOOL: u8 = 0;
const TAG_CHAR: u8 = 1;
const TAG_OCTET: u8 = 2;
const TAG_I16: u8 = 3;
const TAG_U16: u8 = 4;
const TAG_I32: u8 = 5;
const TAG_U32: u8 = 6;
const TAG_I64: u8 = 7;
const TAG_U64: u8 = 8;
const TAG_F32: u8 = 9;
const TAG_F64: u8 = 10;
const TAG_STRING: u8 = 11;
const TAG_ENUM: u8 = 12;
const TAG_ARRAY: u8 = 13;
const TAG_SEQUENCE: u8 = 14;
const TAG_UNION: u8 = 15;
const TAG_STRUCT: u8 = 16;
const TAG_OPTIONAL: u8 = 17;

fn write_all(values: &[Value], buf: &mut impl BufMut) {
    buf.put_u64_le(values.len() as u64);
    for value in values {
        value.write(buf);
    }
}

fn write_option(value: Option<&Value>, buf: &mut impl BufMut) {
    match value {
        Some(value) => {
            buf.put_u8(1);
            value.write(buf);
        }
        None => buf.put_u8(0),
    }
}

fn fmt_list(f: &mut fmt::Formatter<'_>, open: &str, values: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{:?}", *v as char),
            Self::Octet(v) => write!(f, "0x{v:02x}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v:?}"),
            Self::F64(v) => write!(f, "{v:?}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Enum(v) => write!(f, "#{v}"),
            Self::Array(values) | Self::Sequence(values) => fmt_list(f, "[", values, "]"),
            Self::Struct(values) => fmt_list(f, "{", values, "}"),
            Self::Union {
                discriminant,
                payload: Some(payload),
            } => write!(f, "<{discriminant}: {payload}>"),
            Self::Union {
                discriminant,
                payload: None,
            } => write!(f, "<{discriminant}>"),
            Self::Optional(Some(inner)) => write!(f, "{inner}"),
            Self::Optional(None) => f.write_str("null"),
        }
    }
}

/// A generated (or received) instance of a schema type.
///
/// A [Sample] exclusively owns every dynamically sized part of its value (strings, sequence
/// buffers, optional payloads). Validation and comparison only borrow it, and all owned parts are
/// released exactly once when the sample goes out of scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    value: Value,
}

impl Sample {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Deterministic encoding of the sample.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.value.write(&mut buf);
        buf
    }
}

impl From<Value> for Sample {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

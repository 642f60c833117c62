use std::cmp::Ordering;
use std::fmt;

use bytes::{Buf, BufMut};

use super::config::MAX_STRING_KEY_LEN;
use super::error::{PinbaseError, Result};

/// Key data types an index can be built over.
/// The discriminant is the tag stored in the index header page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer: 4 bytes, little-endian
    Int,
    /// 32-bit floating point: 4 bytes, IEEE 754
    Float,
    /// UTF-8 string: 2-byte length + `MAX_STRING_KEY_LEN` bytes, zero padded
    String,
    /// Boolean: 1 byte (0 = false, 1 = true)
    Bool,
}

impl DataType {
    /// Returns the tag used for serialization in the header page.
    pub fn type_id(&self) -> i32 {
        match self {
            DataType::Int => 0,
            DataType::Float => 1,
            DataType::String => 2,
            DataType::Bool => 3,
        }
    }

    pub fn from_type_id(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(DataType::Int),
            1 => Some(DataType::Float),
            2 => Some(DataType::String),
            3 => Some(DataType::Bool),
            _ => None,
        }
    }

    /// Width in bytes of one key slot on a node page.
    pub fn key_width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::String => 2 + MAX_STRING_KEY_LEN,
            DataType::Bool => 1,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::String => write!(f, "STRING"),
            DataType::Bool => write!(f, "BOOL"),
        }
    }
}

/// A typed key value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::String,
            Value::Bool(_) => DataType::Bool,
        }
    }

    /// Checks that this value can be stored as a key of `expected` type.
    pub fn validate_key(&self, expected: DataType) -> Result<()> {
        let found = self.data_type();
        if found != expected {
            return Err(PinbaseError::KeyTypeMismatch { expected, found });
        }
        match self {
            Value::String(s) if s.len() > MAX_STRING_KEY_LEN => Err(PinbaseError::KeyTooLong {
                len: s.len(),
                max: MAX_STRING_KEY_LEN,
            }),
            Value::Float(v) if v.is_nan() => {
                Err(PinbaseError::InvalidKey("NaN has no position in key order".into()))
            }
            _ => Ok(()),
        }
    }

    /// Type-directed key comparison.
    ///
    /// Numbers compare numerically and strings by bytes. Booleans only know
    /// equal / not-equal: any two distinct booleans report `Less`, so boolean
    /// keys have no consistent order and callers must not depend on one.
    pub fn compare_key(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Bool(a), Value::Bool(b)) => {
                if a == b {
                    Ordering::Equal
                } else {
                    Ordering::Less
                }
            }
            // Keys are validated against the index type before they reach a node.
            (a, b) => a.data_type().type_id().cmp(&b.data_type().type_id()),
        }
    }

    /// Writes this key into a fixed-width slot of `data_type`.
    pub fn encode_key<B: BufMut>(&self, buf: &mut B) {
        match self {
            Value::Int(v) => buf.put_i32_le(*v),
            Value::Float(v) => buf.put_f32_le(*v),
            Value::Bool(v) => buf.put_u8(u8::from(*v)),
            Value::String(s) => {
                let bytes = s.as_bytes();
                buf.put_u16_le(bytes.len() as u16);
                buf.put_slice(bytes);
                buf.put_bytes(0, MAX_STRING_KEY_LEN - bytes.len());
            }
        }
    }

    /// Reads one fixed-width key slot of `data_type`.
    pub fn decode_key<B: Buf>(buf: &mut B, data_type: DataType) -> Option<Self> {
        if buf.remaining() < data_type.key_width() {
            return None;
        }
        let value = match data_type {
            DataType::Int => Value::Int(buf.get_i32_le()),
            DataType::Float => Value::Float(buf.get_f32_le()),
            DataType::Bool => Value::Bool(buf.get_u8() != 0),
            DataType::String => {
                let len = buf.get_u16_le() as usize;
                if len > MAX_STRING_KEY_LEN {
                    return None;
                }
                let mut raw = [0u8; MAX_STRING_KEY_LEN];
                buf.copy_to_slice(&mut raw);
                Value::String(String::from_utf8_lossy(&raw[..len]).into_owned())
            }
        };
        Some(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.6}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Native-side value read out of an application object.
///
/// Every variant up to `Uuid` has a wire encoding. `Array` and `Opaque`
/// exist so that unsupported shapes travel as far as the converter, which
/// rejects them with the offending type name.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Char(char),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Decimal(BigDecimal),
    BigInt(BigInt),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Symbolic variant name of an enumeration.
    Enum(String),
    Uuid(Uuid),

    Array(Vec<Value>),
    /// A value of some type the wire cannot carry.
    Opaque(&'static str),
}

impl Value {
    /// Runtime type name, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int8(_) => "i8",
            Value::Int16(_) => "i16",
            Value::Int32(_) => "i32",
            Value::Int64(_) => "i64",
            Value::Char(_) => "char",
            Value::Float32(_) => "f32",
            Value::Float64(_) => "f64",
            Value::String(_) => "String",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "Vec<u8>",
            Value::Decimal(_) => "bigdecimal::BigDecimal",
            Value::BigInt(_) => "num_bigint::BigInt",
            Value::Timestamp(_) => "chrono::NaiveDateTime",
            Value::Date(_) => "chrono::NaiveDate",
            Value::Time(_) => "chrono::NaiveTime",
            Value::Enum(_) => "enum",
            Value::Uuid(_) => "uuid::Uuid",
            Value::Array(_) => "array",
            Value::Opaque(name) => *name,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Conversion of a native Rust value into a [`Value`].
///
/// Implemented for every scalar the wire supports. Getters and fields
/// registered in a [`TypeInfo`](crate::schema::TypeInfo) go through this
/// trait, so a member whose type lacks it cannot be registered as readable.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! to_value_impl {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }
            }
        )*
    };
}

to_value_impl! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    char => Char,
    f32 => Float32,
    f64 => Float64,
    String => String,
    bool => Bool,
    Vec<u8> => Bytes,
    BigDecimal => Decimal,
    BigInt => BigInt,
    NaiveDateTime => Timestamp,
    NaiveDate => Date,
    NaiveTime => Time,
    Uuid => Uuid,
}

impl ToValue for u8 {
    fn to_value(&self) -> Value {
        Value::Int16(i16::from(*self))
    }
}

impl ToValue for u16 {
    fn to_value(&self) -> Value {
        Value::Int32(i32::from(*self))
    }
}

impl ToValue for u32 {
    fn to_value(&self) -> Value {
        Value::Int64(i64::from(*self))
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

macro_rules! to_value_array_impl {
    ($($ty:ty),*) => {
        $(
            impl ToValue for Vec<$ty> {
                fn to_value(&self) -> Value {
                    Value::Array(self.iter().map(ToValue::to_value).collect())
                }
            }
        )*
    };
}

to_value_array_impl!(String, i32, i64, f64, bool, Value);

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        match self {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n.as_f64().map(Value::Float64).unwrap_or(Value::Opaque("serde_json::Number")),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(ToValue::to_value).collect())
            }
            serde_json::Value::Object(_) => Value::Opaque("serde_json::Map"),
        }
    }
}

macro_rules! from_native_impl {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

from_native_impl!(
    i8, i16, i32, i64, u8, u16, u32, char, f32, f64, String, bool, Vec<u8>, BigDecimal, BigInt,
    NaiveDateTime, NaiveDate, NaiveTime, Uuid
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

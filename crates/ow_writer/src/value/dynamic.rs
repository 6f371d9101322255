use crate::WriteError;
use crate::sink::Scalar;
use crate::value::{ValueKind, WriteValue};
use crate::write::WriteContext;

/// A value whose shape is only known at run time.
///
/// Used for open properties and custom annotations. Objects keep their
/// insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Binary(Vec<u8>),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl WriteValue for Value {
    const KIND: ValueKind = ValueKind::Dynamic;

    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        let scalar = match self {
            Value::Null => Scalar::Null,
            Value::Bool(value) => Scalar::Bool(*value),
            Value::Int(value) => Scalar::Int(*value),
            Value::UInt(value) => Scalar::UInt(*value),
            Value::Float(value) => Scalar::Float(*value),
            Value::Text(text) => return cx.write_text(text),
            Value::Binary(bytes) => return cx.write_binary(bytes),
            Value::List(items) => return cx.write_sequence(|index| items.get(index)),
            Value::Object(entries) => {
                let entries = entries.iter().map(|(name, value)| (name.as_str(), value));
                return cx.write_object(entries);
            }
        };
        cx.sink().write_scalar(scalar)?;
        Ok(true)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from!(
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => UInt,
    u64 => UInt,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<Value> => List
);

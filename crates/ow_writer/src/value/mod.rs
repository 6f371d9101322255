//! How individual values are written.
//!
//! [`WriteValue`] is implemented for primitives, text, [`Binary`], sequences,
//! the dynamic [`Value`] and every derived [`Resource`](crate::Resource).
//!
//! An implementation returns `Ok(true)` once the value is completely written
//! and `Ok(false)` when it stopped because the sink asked to suspend. In the
//! latter case it is called again later with the same value and must continue
//! from where it stopped, using the frame stored by
//! [`WriteContext`](crate::write::WriteContext). Bounded values may be written
//! atomically and never return `Ok(false)`.

mod collection;
mod dynamic;
mod scalar;
mod text;

pub use dynamic::Value;
pub use text::Binary;

use crate::WriteError;
use crate::write::WriteContext;

/// Broad category of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Primitive,
    Text,
    Binary,
    Resource,
    Collection,
    Dynamic,
}

/// A value the writer can emit.
pub trait WriteValue {
    const KIND: ValueKind;

    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError>;
}

impl<V: WriteValue> WriteValue for Option<V> {
    const KIND: ValueKind = V::KIND;

    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        match self {
            Some(value) => value.write_value(cx),
            None => {
                cx.sink().write_scalar(crate::sink::Scalar::Null)?;
                Ok(true)
            }
        }
    }
}

macro_rules! impl_delegate {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<V: WriteValue + ?Sized> WriteValue for $ty {
                const KIND: ValueKind = V::KIND;

                #[inline]
                fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
                    (**self).write_value(cx)
                }
            }
        )*
    };
}

impl_delegate!(&V, Box<V>, alloc::sync::Arc<V>);

/// Implements [`WriteValue`] for a type with a hand-written [`Resource`](crate::Resource) impl.
///
/// `#[derive(Resource)]` emits the same implementation.
#[macro_export]
macro_rules! impl_resource_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::value::WriteValue for $ty {
                const KIND: $crate::value::ValueKind = $crate::value::ValueKind::Resource;

                fn write_value(
                    &self,
                    cx: &mut $crate::write::WriteContext<'_>,
                ) -> ::core::result::Result<bool, $crate::WriteError> {
                    cx.write_nested(self)
                }
            }
        )*
    };
}

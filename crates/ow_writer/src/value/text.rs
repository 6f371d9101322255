use alloc::borrow::Cow;

use crate::WriteError;
use crate::value::{ValueKind, WriteValue};
use crate::write::WriteContext;

impl WriteValue for str {
    const KIND: ValueKind = ValueKind::Text;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.write_text(self)
    }
}

macro_rules! impl_text {
    ($($ty:ty),*) => {
        $(
            impl WriteValue for $ty {
                const KIND: ValueKind = ValueKind::Text;

                #[inline]
                fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
                    cx.write_text(self)
                }
            }
        )*
    };
}

impl_text!(String, Cow<'static, str>);

/// Bytes written as a base64 string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binary(pub Vec<u8>);

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl WriteValue for Binary {
    const KIND: ValueKind = ValueKind::Binary;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.write_binary(&self.0)
    }
}

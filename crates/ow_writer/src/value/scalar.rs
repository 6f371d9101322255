use crate::WriteError;
use crate::sink::Scalar;
use crate::value::{ValueKind, WriteValue};
use crate::write::WriteContext;

macro_rules! impl_scalar {
    ($variant:ident as $cast:ty: $($ty:ty),*) => {
        $(
            impl WriteValue for $ty {
                const KIND: ValueKind = ValueKind::Primitive;

                #[inline]
                fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
                    cx.sink().write_scalar(Scalar::$variant(*self as $cast))?;
                    Ok(true)
                }
            }
        )*
    };
}

impl_scalar!(Int as i64: i8, i16, i32, i64, isize);
impl_scalar!(UInt as u64: u8, u16, u32, u64, usize);
impl_scalar!(Float as f64: f32, f64);

impl WriteValue for bool {
    const KIND: ValueKind = ValueKind::Primitive;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.sink().write_scalar(Scalar::Bool(*self))?;
        Ok(true)
    }
}

impl WriteValue for char {
    const KIND: ValueKind = ValueKind::Primitive;

    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        let mut buf = [0u8; 4];
        cx.sink().write_scalar(Scalar::Str(self.encode_utf8(&mut buf)))?;
        Ok(true)
    }
}

impl WriteValue for () {
    const KIND: ValueKind = ValueKind::Primitive;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.sink().write_scalar(Scalar::Null)?;
        Ok(true)
    }
}

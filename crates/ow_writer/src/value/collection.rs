use alloc::collections::VecDeque;

use crate::WriteError;
use crate::value::{ValueKind, WriteValue};
use crate::write::WriteContext;

impl<V: WriteValue> WriteValue for [V] {
    const KIND: ValueKind = ValueKind::Collection;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.write_sequence(|index| self.get(index))
    }
}

impl<V: WriteValue, const N: usize> WriteValue for [V; N] {
    const KIND: ValueKind = ValueKind::Collection;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.write_sequence(|index| self.get(index))
    }
}

impl<V: WriteValue> WriteValue for Vec<V> {
    const KIND: ValueKind = ValueKind::Collection;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.write_sequence(|index| self.get(index))
    }
}

impl<V: WriteValue> WriteValue for VecDeque<V> {
    const KIND: ValueKind = ValueKind::Collection;

    #[inline]
    fn write_value(&self, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        cx.write_sequence(|index| self.get(index))
    }
}

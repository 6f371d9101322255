use core::any::Any;
use core::fmt;

use crate::info::{AnnotationAccessor, AnnotationKind, AnnotationPosition, AnnotationSet};
use crate::info::{EncodedName, PropertyName};
use crate::value::{ValueKind, WriteValue};
use crate::write::WriteContext;
use crate::{MetaError, WriteError};

/// Object-safe view of a [`PropertyInfo`] of a resource type `T`.
pub trait MemberInfo<T>: Send + Sync + 'static {
    /// The property name, `None` until it is assigned.
    fn name(&self) -> Option<&EncodedName>;

    fn property_name(&self) -> &PropertyName;

    fn value_kind(&self) -> ValueKind;

    fn value_type_name(&self) -> &'static str;

    fn annotation_position(&self) -> AnnotationPosition;

    fn annotations(&self) -> &AnnotationSet<T>;

    /// Evaluates the skip predicate against the current value.
    fn should_skip(&self, resource: &T) -> bool;

    /// Writes the value of this property, see [`WriteValue::write_value`].
    fn write_value(&self, resource: &T, cx: &mut WriteContext<'_>) -> Result<bool, WriteError>;

    fn as_any(&self) -> &dyn Any;
}

/// Metadata of one property of `T` holding a `V`.
///
/// # Examples
///
/// ```
/// use ow_writer::info::{AnnotationAccessor, AnnotationKind, AnnotationValue, PropertyInfo};
///
/// struct Order {
///     lines: Vec<u32>,
/// }
///
/// fn line_count(order: &Order) -> Option<AnnotationValue> {
///     Some(AnnotationValue::Count(order.lines.len() as u64))
/// }
///
/// let info = PropertyInfo::<Order, Vec<u32>>::new("Lines", |o| &o.lines)
///     .unwrap()
///     .with_annotation(AnnotationKind::Count, AnnotationAccessor::Value(line_count))
///     .unwrap();
///
/// assert_eq!(info.name().unwrap().as_str(), "Lines");
/// ```
pub struct PropertyInfo<T, V> {
    name: PropertyName,
    getter: fn(&T) -> &V,
    annotations: AnnotationSet<T>,
    position: AnnotationPosition,
    skip: Option<fn(&T, &V) -> bool>,
}

impl<T: 'static, V: WriteValue + 'static> PropertyInfo<T, V> {
    pub fn new(name: &str, getter: fn(&T) -> &V) -> Result<Self, MetaError> {
        Ok(Self {
            name: PropertyName::new(name)?,
            ..Self::unnamed(getter)
        })
    }

    /// Creates a property whose name is assigned later with [`set_name`](Self::set_name).
    pub fn unnamed(getter: fn(&T) -> &V) -> Self {
        Self {
            name: PropertyName::unset(),
            getter,
            annotations: AnnotationSet::new(),
            position: AnnotationPosition::Auto,
            skip: None,
        }
    }

    #[inline]
    pub fn set_name(&self, name: &str) -> Result<(), MetaError> {
        self.name.set(name)
    }

    #[inline]
    pub fn name(&self) -> Option<&EncodedName> {
        self.name.get()
    }

    pub fn with_annotation(
        mut self,
        kind: AnnotationKind,
        accessor: AnnotationAccessor<T>,
    ) -> Result<Self, MetaError> {
        let owner = self.name.get().map_or("<unnamed>", EncodedName::as_str);
        self.annotations.insert(kind, accessor, owner)?;
        Ok(self)
    }

    #[inline]
    pub fn with_position(mut self, position: AnnotationPosition) -> Self {
        self.position = position;
        self
    }

    /// Omits the property (name, annotations and value) when `predicate` holds.
    #[inline]
    pub fn skip_if(mut self, predicate: fn(&T, &V) -> bool) -> Self {
        self.skip = Some(predicate);
        self
    }

    #[inline]
    pub fn get<'r>(&self, resource: &'r T) -> &'r V {
        (self.getter)(resource)
    }
}

impl<T: 'static, V: WriteValue + PartialEq + Default + 'static> PropertyInfo<T, V> {
    /// Omits the property while it holds `V::default()`.
    pub fn skip_if_default(self) -> Self {
        self.skip_if(|_, value| *value == V::default())
    }
}

impl<T: 'static, V: WriteValue + 'static> MemberInfo<T> for PropertyInfo<T, V> {
    #[inline]
    fn name(&self) -> Option<&EncodedName> {
        self.name.get()
    }

    #[inline]
    fn property_name(&self) -> &PropertyName {
        &self.name
    }

    #[inline]
    fn value_kind(&self) -> ValueKind {
        V::KIND
    }

    #[inline]
    fn value_type_name(&self) -> &'static str {
        core::any::type_name::<V>()
    }

    #[inline]
    fn annotation_position(&self) -> AnnotationPosition {
        self.position
    }

    #[inline]
    fn annotations(&self) -> &AnnotationSet<T> {
        &self.annotations
    }

    fn should_skip(&self, resource: &T) -> bool {
        self.skip
            .is_some_and(|predicate| predicate(resource, (self.getter)(resource)))
    }

    fn write_value(&self, resource: &T, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        (self.getter)(resource).write_value(cx)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T, V> fmt::Debug for PropertyInfo<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("value", &core::any::type_name::<V>())
            .field("annotations", &self.annotations)
            .field("position", &self.position)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{AnnotationMask, AnnotationValue};

    struct Line {
        qty: u32,
        note: String,
    }

    fn total(_: &Line) -> Option<AnnotationValue> {
        Some(AnnotationValue::Count(1))
    }

    #[test]
    fn late_name_is_set_once() {
        let info = PropertyInfo::<Line, u32>::unnamed(|l| &l.qty);
        assert!(info.name().is_none());

        info.set_name("Qty").unwrap();
        assert!(info.set_name("Quantity").is_err());
        assert_eq!(info.name().unwrap().as_str(), "Qty");
    }

    #[test]
    fn skip_predicates() {
        let line = Line {
            qty: 0,
            note: String::new(),
        };
        let qty = PropertyInfo::<Line, u32>::new("Qty", |l| &l.qty)
            .unwrap()
            .skip_if_default();
        assert!(MemberInfo::should_skip(&qty, &line));

        let note = PropertyInfo::<Line, String>::new("Note", |l| &l.note)
            .unwrap()
            .skip_if(|line, _| line.qty > 0);
        assert!(!MemberInfo::should_skip(&note, &line));
    }

    #[test]
    fn member_view() {
        let info = PropertyInfo::<Line, u32>::new("Qty", |l| &l.qty)
            .unwrap()
            .with_annotation(AnnotationKind::Count, AnnotationAccessor::Value(total))
            .unwrap()
            .with_position(AnnotationPosition::PostValue);

        let member: &dyn MemberInfo<Line> = &info;
        assert_eq!(member.value_kind(), ValueKind::Primitive);
        assert_eq!(member.annotations().mask(), AnnotationMask::COUNT);
        assert_eq!(member.annotation_position(), AnnotationPosition::PostValue);
        assert!(member.as_any().is::<PropertyInfo<Line, u32>>());
    }
}

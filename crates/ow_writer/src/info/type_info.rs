use core::any::{Any, TypeId};
use core::fmt;

use ow_utils::hash::HashMap;

use crate::info::{AnnotationSet, MemberInfo, PropertyInfo};
use crate::select::PropertySelector;
use crate::value::WriteValue;
use crate::write::{WriteContext, write_resource_body};
use crate::WriteError;

/// Returns the container behind a custom-annotation or dynamic-property member.
pub type ContainerAccessor<T> = fn(&T) -> &dyn Any;

/// Immutable metadata of the resource type `T`.
///
/// Obtained from a [`MetadataFactory`](crate::MetadataFactory), which builds
/// it once and shares it for the rest of the process.
pub struct TypeInfo<T: 'static> {
    pub(super) type_name: &'static str,
    pub(super) members: Box<[Box<dyn MemberInfo<T>>]>,
    pub(super) index: HashMap<Box<str>, usize>,
    pub(super) annotations: AnnotationSet<T>,
    pub(super) custom_annotations: Option<ContainerAccessor<T>>,
    pub(super) dynamic_properties: Option<ContainerAccessor<T>>,
    pub(super) before_serialize: Option<fn(&T)>,
    pub(super) after_serialize: Option<fn(&T)>,
    pub(super) selector: Box<dyn PropertySelector<T>>,
}

impl<T: 'static> TypeInfo<T> {
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the number of declared properties.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn member(&self, index: usize) -> Option<&dyn MemberInfo<T>> {
        self.members.get(index).map(Box::as_ref)
    }

    /// Returns the members in declaration order.
    pub fn members(&self) -> impl ExactSizeIterator<Item = &dyn MemberInfo<T>> {
        self.members.iter().map(Box::as_ref)
    }

    /// Returns the declaration index of the property called `name`.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn member_named(&self, name: &str) -> Option<&dyn MemberInfo<T>> {
        self.member(self.index_of(name)?)
    }

    /// Typed access to a property, `None` if it does not exist or holds another type.
    pub fn property<V: WriteValue + 'static>(&self, name: &str) -> Option<&PropertyInfo<T, V>> {
        self.member_named(name)?.as_any().downcast_ref()
    }

    /// Returns the property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .filter_map(|member| member.name().map(|name| name.as_str()))
    }

    #[inline]
    pub fn annotations(&self) -> &AnnotationSet<T> {
        &self.annotations
    }

    #[inline]
    pub fn custom_annotations(&self) -> Option<ContainerAccessor<T>> {
        self.custom_annotations
    }

    #[inline]
    pub fn dynamic_properties(&self) -> Option<ContainerAccessor<T>> {
        self.dynamic_properties
    }

    #[inline]
    pub fn before_serialize(&self) -> Option<fn(&T)> {
        self.before_serialize
    }

    #[inline]
    pub fn after_serialize(&self) -> Option<fn(&T)> {
        self.after_serialize
    }

    /// The selector used when a write does not supply one.
    #[inline]
    pub fn selector(&self) -> &dyn PropertySelector<T> {
        self.selector.as_ref()
    }
}

impl<T: 'static> fmt::Debug for TypeInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_name", &self.type_name)
            .field("properties", &self.property_names().collect::<Vec<_>>())
            .field("annotations", &self.annotations)
            .field("custom_annotations", &self.custom_annotations.is_some())
            .field("dynamic_properties", &self.dynamic_properties.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ErasedTypeInfo

/// Object-safe view of a [`TypeInfo`], for callers that only know a `TypeId`.
pub trait ErasedTypeInfo: Send + Sync + 'static {
    fn type_name(&self) -> &'static str;

    fn resource_type_id(&self) -> TypeId;

    fn property_names(&self) -> Vec<&str>;

    /// Writes `resource`, which must be of the described type.
    fn write_any(&self, resource: &dyn Any, cx: &mut WriteContext<'_>) -> Result<bool, WriteError>;

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn ErasedTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedTypeInfo")
            .field("type_name", &self.type_name())
            .field("properties", &self.property_names())
            .finish()
    }
}

impl<T: Send + Sync + 'static> ErasedTypeInfo for TypeInfo<T> {
    #[inline]
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    fn resource_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn property_names(&self) -> Vec<&str> {
        TypeInfo::property_names(self).collect()
    }

    fn write_any(&self, resource: &dyn Any, cx: &mut WriteContext<'_>) -> Result<bool, WriteError> {
        let resource = resource
            .downcast_ref::<T>()
            .ok_or(WriteError::ResourceTypeMismatch {
                expected: self.type_name,
            })?;
        write_resource_body(self, None, resource, cx)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

//! Resource metadata: what a resource type looks like on the wire.
//!
//! ## Menu
//!
//! - [`Resource`]: A trait for types that describe themselves into a [`TypeInfoBuilder`].
//!     - Usually implemented through `#[derive(Resource)]`.
//!
//! - [`TypeInfo`]: Immutable, shared metadata of one resource type, built once by the
//!   [`MetadataFactory`](crate::MetadataFactory).
//!     - [`ErasedTypeInfo`]: object-safe view used by late-bound writes.
//!
//! - [`PropertyInfo`]: One named member with a compiled getter, optional annotation accessors,
//!   an [`AnnotationPosition`] and an optional skip predicate.
//!     - [`MemberInfo`]: object-safe view, so a `TypeInfo<T>` can hold members of different value types.
//!
//! - [`PropertyName`]: Set-once holder of an [`EncodedName`], the pre-encoded wire form of a name.
//!
//! - Annotations:
//!     - [`AnnotationKind`]: `odata.count`, `odata.nextLink` and `odata.etag`.
//!     - [`AnnotationAccessor`]: produces a value, or writes through an [`AnnotationWriter`].
//!     - [`AnnotationSet`]: at most one accessor per kind.
//!     - [`AnnotationMask`]: bit set of kinds, used to suppress duplicated output.

// -----------------------------------------------------------------------------
// Modules

mod annotation;
mod builder;
mod name;
mod property_info;
mod resource;
mod type_info;

// -----------------------------------------------------------------------------
// Exports

pub use annotation::{AnnotationAccessor, AnnotationKind, AnnotationMask, AnnotationPosition};
pub use annotation::{AnnotationSet, AnnotationValue, AnnotationWriter};
pub use builder::TypeInfoBuilder;
pub use name::{EncodedName, PropertyName};
pub use property_info::{MemberInfo, PropertyInfo};
pub use resource::Resource;
pub use type_info::{ContainerAccessor, ErasedTypeInfo, TypeInfo};

pub(crate) use annotation::write_annotation;

use crate::info::{TypeInfo, TypeInfoBuilder};
use crate::{MetaError, MetadataFactory};

/// A type that can be written by the [`ResourceWriter`](crate::ResourceWriter).
///
/// Usually derived; a manual implementation describes its members into the
/// builder and must also implement [`WriteValue`](crate::value::WriteValue)
/// (see [`impl_resource_value!`](crate::impl_resource_value)) to be nested
/// inside other resources.
///
/// # Examples
///
/// ```
/// use ow_writer::{MetaError, Resource, impl_resource_value};
/// use ow_writer::info::TypeInfoBuilder;
///
/// struct Customer {
///     name: String,
/// }
///
/// impl Resource for Customer {
///     fn describe(builder: &mut TypeInfoBuilder<Self>) -> Result<(), MetaError> {
///         builder.property("Name", |c: &Customer| &c.name);
///         Ok(())
///     }
/// }
///
/// impl_resource_value!(Customer);
///
/// let info = Customer::type_info().unwrap();
/// assert_eq!(info.index_of("Name"), Some(0));
/// ```
pub trait Resource: Send + Sync + Sized + 'static {
    /// The name used in diagnostics.
    fn type_name() -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Declares the members, annotations and hooks of this type.
    ///
    /// Called at most once per [`MetadataFactory`], the first time the
    /// metadata is requested. It must not request metadata of `Self`.
    fn describe(builder: &mut TypeInfoBuilder<Self>) -> Result<(), MetaError>;

    /// Metadata from the [shared factory](MetadataFactory::shared).
    fn type_info() -> Result<&'static TypeInfo<Self>, MetaError> {
        MetadataFactory::shared().create_type_info::<Self>()
    }
}

//! Handlers for custom-annotation and open-property containers.
//!
//! A resource exposes such a container as `&dyn Any`. The [`HandlerResolver`]
//! finds a [`ContainerHandler`] for the container's concrete type by asking
//! its [`HandlerFactory`]s in registration order, and caches the answer
//! (including "no handler") per type.

mod containers;
mod resolver;

pub use containers::{DictionaryFactory, EntryContainer, EntryHandler, PairsFactory};
pub use resolver::HandlerResolver;

use alloc::sync::Arc;
use core::any::{Any, TypeId};

use crate::WriteError;
use crate::write::WriteContext;

/// How the entries of a container are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    /// `name: value`
    OpenProperty,
    /// `@name: value`
    Annotation,
}

/// Writes the entries of one container type.
///
/// Must follow the same suspend and resume discipline as
/// [`WriteValue`](crate::value::WriteValue); the helpers on [`WriteContext`]
/// do this.
pub trait ContainerHandler: Send + Sync + 'static {
    fn write_entries(
        &self,
        container: &dyn Any,
        target: EntryTarget,
        cx: &mut WriteContext<'_>,
    ) -> Result<bool, WriteError>;
}

/// Creates handlers for the container types it recognizes.
pub trait HandlerFactory: Send + Sync + 'static {
    fn can_handle(&self, type_id: TypeId) -> bool;

    fn create(&self, type_id: TypeId) -> Option<Arc<dyn ContainerHandler>>;
}

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};
use core::hash::BuildHasher;
use core::marker::PhantomData;
use std::collections::HashMap as StdHashMap;

use ow_utils::hash::HashMap;
use ow_utils::hash::hashbrown::HashMap as RawHashMap;

use crate::WriteError;
use crate::resolve::{ContainerHandler, EntryTarget, HandlerFactory};
use crate::value::WriteValue;
use crate::write::WriteContext;

// -----------------------------------------------------------------------------
// EntryContainer

/// A container of named values.
///
/// `entries` must yield the same sequence every time it is called on an
/// unmodified container.
pub trait EntryContainer: Any + Send + Sync {
    type Value: WriteValue;

    fn entries(&self) -> impl Iterator<Item = (&str, &Self::Value)>;
}

impl<V: WriteValue + Send + Sync + 'static> EntryContainer for BTreeMap<String, V> {
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<V, S> EntryContainer for StdHashMap<String, V, S>
where
    V: WriteValue + Send + Sync + 'static,
    S: BuildHasher + Send + Sync + 'static,
{
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<V, S> EntryContainer for RawHashMap<String, V, S>
where
    V: WriteValue + Send + Sync + 'static,
    S: BuildHasher + Send + Sync + 'static,
{
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<V: WriteValue + Send + Sync + 'static> EntryContainer for Vec<(String, V)> {
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<V: WriteValue + Send + Sync + 'static> EntryContainer for Vec<(&'static str, V)> {
    type Value = V;

    fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.iter().map(|(name, value)| (*name, value))
    }
}

// -----------------------------------------------------------------------------
// EntryHandler

/// The [`ContainerHandler`] of one [`EntryContainer`] type.
pub struct EntryHandler<C>(PhantomData<fn() -> C>);

impl<C> EntryHandler<C> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C> Default for EntryHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: EntryContainer> ContainerHandler for EntryHandler<C> {
    fn write_entries(
        &self,
        container: &dyn Any,
        target: EntryTarget,
        cx: &mut WriteContext<'_>,
    ) -> Result<bool, WriteError> {
        let container = container
            .downcast_ref::<C>()
            .ok_or(WriteError::ContainerTypeMismatch { expected: type_name::<C>() })?;
        cx.write_entries(container.entries(), target)
    }
}

fn handler<C: EntryContainer>() -> Arc<dyn ContainerHandler> {
    Arc::new(EntryHandler::<C>::new())
}

// -----------------------------------------------------------------------------
// Factories

/// Handles string-keyed maps with values of type `V`.
///
/// Recognizes `BTreeMap<String, V>`, `std::collections::HashMap<String, V>`
/// and [`ow_utils::hash::HashMap<String, V>`].
pub struct DictionaryFactory<V>(PhantomData<fn() -> V>);

impl<V> DictionaryFactory<V> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for DictionaryFactory<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: WriteValue + Send + Sync + 'static> HandlerFactory for DictionaryFactory<V> {
    fn can_handle(&self, type_id: TypeId) -> bool {
        self.create(type_id).is_some()
    }

    fn create(&self, type_id: TypeId) -> Option<Arc<dyn ContainerHandler>> {
        if type_id == TypeId::of::<BTreeMap<String, V>>() {
            Some(handler::<BTreeMap<String, V>>())
        } else if type_id == TypeId::of::<StdHashMap<String, V>>() {
            Some(handler::<StdHashMap<String, V>>())
        } else if type_id == TypeId::of::<HashMap<String, V>>() {
            Some(handler::<HashMap<String, V>>())
        } else {
            None
        }
    }
}

/// Handles ordered `(name, value)` lists with values of type `V`.
pub struct PairsFactory<V>(PhantomData<fn() -> V>);

impl<V> PairsFactory<V> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<V> Default for PairsFactory<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: WriteValue + Send + Sync + 'static> HandlerFactory for PairsFactory<V> {
    fn can_handle(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<Vec<(String, V)>>()
            || type_id == TypeId::of::<Vec<(&'static str, V)>>()
    }

    fn create(&self, type_id: TypeId) -> Option<Arc<dyn ContainerHandler>> {
        if type_id == TypeId::of::<Vec<(String, V)>>() {
            Some(handler::<Vec<(String, V)>>())
        } else if type_id == TypeId::of::<Vec<(&'static str, V)>>() {
            Some(handler::<Vec<(&'static str, V)>>())
        } else {
            None
        }
    }
}

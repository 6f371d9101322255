use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::{PoisonError, RwLock};

use ow_utils::TypeIdMap;

use crate::resolve::{ContainerHandler, DictionaryFactory, HandlerFactory, PairsFactory};
use crate::value::Value;

/// Resolves container handlers by type, caching every answer.
///
/// The cache is cleared when a factory is registered, so a type that had no
/// handler is looked up again.
pub struct HandlerResolver {
    factories: Vec<Box<dyn HandlerFactory>>,
    cache: RwLock<TypeIdMap<Option<Arc<dyn ContainerHandler>>>>,
}

impl HandlerResolver {
    /// A resolver without factories.
    pub const fn new() -> Self {
        Self {
            factories: Vec::new(),
            cache: RwLock::new(TypeIdMap::new()),
        }
    }

    /// A resolver for string-keyed dictionaries and pair lists of
    /// [`Value`], `String`, `i64`, `f64` and `bool`.
    pub fn with_defaults() -> Self {
        let mut resolver = Self::new();
        resolver
            .register(DictionaryFactory::<Value>::new())
            .register(DictionaryFactory::<String>::new())
            .register(DictionaryFactory::<i64>::new())
            .register(DictionaryFactory::<f64>::new())
            .register(DictionaryFactory::<bool>::new())
            .register(PairsFactory::<Value>::new())
            .register(PairsFactory::<String>::new())
            .register(PairsFactory::<i64>::new())
            .register(PairsFactory::<f64>::new())
            .register(PairsFactory::<bool>::new());
        resolver
    }

    /// Appends a factory. Earlier factories take precedence.
    pub fn register(&mut self, factory: impl HandlerFactory) -> &mut Self {
        self.factories.push(Box::new(factory));
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self
    }

    /// Returns the handler for the concrete type of `container`.
    #[inline]
    pub fn resolve(&self, container: &dyn Any) -> Option<Arc<dyn ContainerHandler>> {
        self.resolve_type(container.type_id())
    }

    pub fn resolve_type(&self, type_id: TypeId) -> Option<Arc<dyn ContainerHandler>> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();
        if let Some(handler) = cached {
            return handler;
        }

        let handler = self
            .factories
            .iter()
            .find(|factory| factory.can_handle(type_id))
            .and_then(|factory| factory.create(type_id));
        log::debug!(
            "resolved container handler for {type_id:?}: {}",
            if handler.is_some() { "found" } else { "none" }
        );

        // A concurrent resolution may have inserted first; keep that one.
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(type_id, || handler)
            .clone()
    }

    /// Returns the number of registered factories.
    #[inline]
    pub fn len(&self) -> usize {
        self.factories.len()
    }
}

impl Default for HandlerResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HandlerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerResolver")
            .field("factories", &self.factories.len())
            .finish_non_exhaustive()
    }
}

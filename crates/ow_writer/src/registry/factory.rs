use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use ow_utils::TypeIdMap;

use crate::info::{ErasedTypeInfo, Resource, TypeInfo, TypeInfoBuilder};
use crate::MetaError;

type Constructor = fn(&MetadataFactory) -> Result<&'static dyn ErasedTypeInfo, MetaError>;

// -----------------------------------------------------------------------------
// MetadataFactory

/// Builds [`TypeInfo`] on first request and returns the same instance afterwards.
///
/// Lookups take a read lock only. A miss takes a lock dedicated to the
/// requested type, so concurrent first requests for one type build it once
/// while different types are built in parallel. Failed builds are not cached:
/// every request reports the error again.
///
/// Metadata is leaked on construction and lives for the rest of the process.
///
/// # Examples
///
/// ```
/// use ow_writer::{MetaError, MetadataFactory, Resource};
/// use ow_writer::info::TypeInfoBuilder;
///
/// struct Tag {
///     label: String,
/// }
///
/// impl Resource for Tag {
///     fn describe(builder: &mut TypeInfoBuilder<Self>) -> Result<(), MetaError> {
///         builder.property("Label", |t: &Tag| &t.label);
///         Ok(())
///     }
/// }
///
/// let factory = MetadataFactory::new();
/// let first = factory.create_type_info::<Tag>().unwrap();
/// let second = factory.create_type_info::<Tag>().unwrap();
///
/// assert!(core::ptr::eq(first, second));
/// ```
pub struct MetadataFactory {
    cache: RwLock<TypeIdMap<&'static dyn ErasedTypeInfo>>,
    constructors: RwLock<TypeIdMap<Constructor>>,
    build_locks: Mutex<TypeIdMap<Arc<Mutex<()>>>>,
}

impl MetadataFactory {
    /// Creates an empty factory.
    ///
    /// Most callers use [`shared`](Self::shared) instead.
    pub const fn new() -> Self {
        Self {
            cache: RwLock::new(TypeIdMap::new()),
            constructors: RwLock::new(TypeIdMap::new()),
            build_locks: Mutex::new(TypeIdMap::new()),
        }
    }

    /// The process-wide factory.
    pub fn shared() -> &'static MetadataFactory {
        static SHARED: MetadataFactory = MetadataFactory::new();
        &SHARED
    }

    /// Returns the metadata of `T`, building it on the first request.
    pub fn create_type_info<T: Resource>(&self) -> Result<&'static TypeInfo<T>, MetaError> {
        if let Some(info) = self.cached::<T>()? {
            return Ok(info);
        }

        let type_lock = self.build_lock(TypeId::of::<T>());
        let _guard = type_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another thread may have finished while this one waited.
        if let Some(info) = self.cached::<T>()? {
            return Ok(info);
        }

        let mut builder = TypeInfoBuilder::<T>::new(T::type_name());
        T::describe(&mut builder)?;
        let info: &'static TypeInfo<T> = Box::leak(Box::new(builder.build()?));

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), info);

        log::debug!(
            "built resource metadata for `{}` with {} properties",
            info.type_name(),
            info.len()
        );
        Ok(info)
    }

    /// Builds the metadata of `T` now and makes it reachable through
    /// [`create_type_info_dyn`](Self::create_type_info_dyn).
    pub fn register<T: Resource>(&self) -> Result<&'static TypeInfo<T>, MetaError> {
        let constructor: Constructor = construct::<T>;
        self.constructors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .try_insert(TypeId::of::<T>(), || constructor);
        self.create_type_info::<T>()
    }

    /// Late-bound lookup by `TypeId`.
    ///
    /// Returns [`MetaError::UnregisteredType`] for types that were neither
    /// built nor [registered](Self::register).
    pub fn create_type_info_dyn(&self, type_id: TypeId) -> Result<&'static dyn ErasedTypeInfo, MetaError> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied();
        if let Some(info) = cached {
            return Ok(info);
        }

        let constructor = self
            .constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied();
        match constructor {
            Some(construct) => construct(self),
            None => Err(MetaError::UnregisteredType(type_id)),
        }
    }

    /// Registers every type derived with `#[resource(auto_register)]`.
    ///
    /// Returns the number of registered types. Without the `auto_register`
    /// feature this does nothing and returns `Ok(0)`.
    pub fn auto_register(&self) -> Result<usize, MetaError> {
        #[cfg(feature = "auto_register")]
        {
            use crate::__macro_exports::auto_register::AutoRegistration;

            let mut count = 0;
            for entry in inventory::iter::<AutoRegistration> {
                (entry.register)(self)?;
                count += 1;
            }
            log::debug!("auto registered {count} resource types");
            Ok(count)
        }
        #[cfg(not(feature = "auto_register"))]
        {
            Ok(0)
        }
    }

    /// Returns `true` if the metadata of the type is already built.
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&type_id)
    }

    /// Returns the number of built types.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns the names of the built types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|info| info.type_name())
            .collect();
        names.sort_unstable();
        names
    }

    fn cached<T: Resource>(&self) -> Result<Option<&'static TypeInfo<T>>, MetaError> {
        let erased: Option<&'static dyn ErasedTypeInfo> = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_type::<T>()
            .copied();
        match erased {
            None => Ok(None),
            Some(erased) => erased
                .as_any()
                .downcast_ref::<TypeInfo<T>>()
                .map(Some)
                .ok_or(MetaError::TypeMismatch(T::type_name())),
        }
    }

    fn build_lock(&self, type_id: TypeId) -> Arc<Mutex<()>> {
        self.build_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(type_id, Arc::default)
            .clone()
    }
}

impl Default for MetadataFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MetadataFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataFactory")
            .field("types", &self.type_names())
            .finish()
    }
}

fn construct<T: Resource>(factory: &MetadataFactory) -> Result<&'static dyn ErasedTypeInfo, MetaError> {
    Ok(factory.create_type_info::<T>()?)
}

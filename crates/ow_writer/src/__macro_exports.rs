//! Items referenced by `#[derive(Resource)]` expansions.

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::{MetaError, MetadataFactory, Resource};

    /// One type submitted by a `#[resource(auto_register)]` derive.
    pub struct AutoRegistration {
        pub register: fn(&MetadataFactory) -> Result<(), MetaError>,
    }

    inventory::collect!(AutoRegistration);

    pub fn register_type<T: Resource>(factory: &MetadataFactory) -> Result<(), MetaError> {
        factory.register::<T>().map(|_| ())
    }
}

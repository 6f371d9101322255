//! Construction and caching of resource metadata.
//!
//! ## auto_register
//!
//! With the `auto_register` feature (default), every non-generic type derived
//! with `#[resource(auto_register)]` is collected by the [`inventory`] crate and
//! can be registered in one call, see [`MetadataFactory::auto_register`].
//!
//! [`inventory`]: https://docs.rs/inventory

mod factory;

pub use factory::MetadataFactory;

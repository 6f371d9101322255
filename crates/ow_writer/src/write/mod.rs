//! Driving a write.
//!
//! [`ResourceWriter`] is the entry point. Each call writes as much as the
//! sink accepts and returns `Ok(true)` when the resource is complete or
//! `Ok(false)` when it suspended; the progress is kept in the
//! [`WriteState`](crate::WriteState) passed by the caller.

mod context;
mod resource;
mod writer;

pub use context::WriteContext;
pub use writer::{CancellationFlag, ResourceWriter, WriterOptions};

pub(crate) use resource::write_resource_body;

#[cfg(test)]
mod tests;

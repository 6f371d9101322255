#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro resolves the crate through `Manifest`, which yields
// `::ow_writer` inside this crate as well.
extern crate self as ow_writer;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;

pub mod info;
pub mod registry;
pub mod resolve;
pub mod select;
pub mod sink;
pub mod state;
pub mod value;
pub mod write;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::{MetaError, SinkError, WriteError};
pub use info::Resource;
pub use ow_writer_derive::Resource;
pub use registry::MetadataFactory;
pub use state::WriteState;
pub use write::{CancellationFlag, ResourceWriter, WriterOptions};

//! Persisted progress of a suspended write.
//!
//! A write descends through nested levels (resource, collection, text chunk,
//! container entries). Every level that can suspend keeps one [`Frame`] in the
//! [`WriteState`]; atomic values never create one. On the next call the
//! writer walks the same path from the root, finds the stored frame of each
//! level and continues where it stopped.

mod frame;
mod stack;

pub use frame::{ChunkFrame, CollectionFrame, Cursor, EntriesFrame, Frame, FrameKind};
pub use frame::{MemberProgress, ResourceFrame, ResourceStage};
pub use stack::WriteState;

//! Choosing which properties of a resource are written, and in what order.
//!
//! A [`PropertySelector`] walks the members of a [`TypeInfo`] and hands each
//! one to [`WriteContext::write_member`]. Its position is kept in the
//! [`Cursor`](crate::state::Cursor) of the resource frame so that a suspended
//! write continues with the same member.

mod enumerable;
mod fixed;

pub use enumerable::{EnumerableSelector, NameSource};
pub use fixed::FixedListSelector;

use crate::WriteError;
use crate::info::TypeInfo;
use crate::write::WriteContext;

/// Writes the selected properties of a resource.
///
/// Returns `Ok(true)` when every selected property is written and
/// `Ok(false)` on suspension.
pub trait PropertySelector<T>: Send + Sync + 'static {
    fn write_properties(
        &self,
        info: &TypeInfo<T>,
        resource: &T,
        cx: &mut WriteContext<'_>,
    ) -> Result<bool, WriteError>;
}

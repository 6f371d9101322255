use crate::info::TypeInfo;
use crate::select::PropertySelector;
use crate::state::Cursor;
use crate::write::WriteContext;
use crate::{MetaError, WriteError};

/// Writes a fixed list of properties, by default all of them in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FixedListSelector {
    indices: Option<Box<[usize]>>,
}

impl FixedListSelector {
    /// Every property, in declaration order.
    pub const fn all() -> Self {
        Self { indices: None }
    }

    /// The named properties, in the given order.
    ///
    /// Fails on names the type does not declare and on repeated names.
    pub fn of<T>(info: &TypeInfo<T>, names: &[&str]) -> Result<Self, WriteError> {
        let mut indices = Vec::with_capacity(names.len());
        for &name in names {
            let index = info.index_of(name).ok_or_else(|| WriteError::UnknownProperty {
                type_name: info.type_name(),
                name: name.into(),
            })?;
            if indices.contains(&index) {
                return Err(MetaError::DuplicateProperty {
                    type_name: info.type_name(),
                    name: name.into(),
                }
                .into());
            }
            indices.push(index);
        }
        Ok(Self {
            indices: Some(indices.into_boxed_slice()),
        })
    }

    fn member_at<T>(&self, info: &TypeInfo<T>, position: usize) -> Option<usize> {
        match &self.indices {
            None => (position < info.len()).then_some(position),
            Some(indices) => indices.get(position).copied(),
        }
    }
}

impl<T: 'static> PropertySelector<T> for FixedListSelector {
    fn write_properties(
        &self,
        info: &TypeInfo<T>,
        resource: &T,
        cx: &mut WriteContext<'_>,
    ) -> Result<bool, WriteError> {
        let depth = cx.depth() - 1;
        loop {
            let position = match cx.members_cursor()? {
                Cursor::NotStarted => 0,
                Cursor::Index(position) => *position,
                Cursor::Done => return Ok(true),
                Cursor::Enumerator(_) => return Err(WriteError::StaleFrame(depth)),
            };

            let Some(index) = self.member_at(info, position) else {
                *cx.members_cursor()? = Cursor::Done;
                return Ok(true);
            };

            *cx.members_cursor()? = Cursor::Index(position);
            if !cx.write_member(info, index, resource)? {
                return Ok(false);
            }
            *cx.members_cursor()? = Cursor::Index(position + 1);
        }
    }
}

use alloc::borrow::Cow;
use core::fmt;

use crate::info::TypeInfo;
use crate::select::PropertySelector;
use crate::state::Cursor;
use crate::write::WriteContext;
use crate::{MetaError, WriteError};

/// Produces the property names of one resource, in output order.
pub type NameSource<T> = fn(&T) -> Box<dyn Iterator<Item = Cow<'static, str>> + Send>;

/// Writes the properties named by a per-resource enumeration.
///
/// The enumeration is created once per resource and kept in the resource
/// frame while the write is suspended. Each name may appear once.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use ow_writer::{Resource, ResourceWriter, WriteState};
/// use ow_writer::select::EnumerableSelector;
/// use ow_writer::sink::{FlushSink, JsonSink};
///
/// #[derive(Resource)]
/// struct Row {
///     id: u32,
///     label: String,
///     hidden: bool,
/// }
///
/// let selector = EnumerableSelector::new(|_: &Row| {
///     Box::new(["label", "id"].into_iter().map(Cow::Borrowed))
/// });
///
/// let row = Row { id: 3, label: "c".into(), hidden: true };
/// let writer = ResourceWriter::new();
/// let mut state = WriteState::new();
/// let mut sink = JsonSink::new(Vec::<u8>::new(), 64);
///
/// assert!(writer.write_resource_with(&row, &selector, &mut state, &mut sink).unwrap());
/// sink.flush().unwrap();
/// assert_eq!(sink.into_inner().unwrap(), br#"{"label":"c","id":3}"#);
/// ```
pub struct EnumerableSelector<T> {
    source: NameSource<T>,
}

impl<T> EnumerableSelector<T> {
    pub const fn new(source: NameSource<T>) -> Self {
        Self { source }
    }
}

impl<T> fmt::Debug for EnumerableSelector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumerableSelector").finish_non_exhaustive()
    }
}

struct LiveEnumerator {
    names: Box<dyn Iterator<Item = Cow<'static, str>> + Send>,
    /// The member being written, resolved from the last name taken.
    current: Option<usize>,
    /// Members already written, by index.
    seen: Vec<bool>,
    /// A rejected name, raised again on the next call.
    pending: Option<Cow<'static, str>>,
}

impl<T: Send + Sync + 'static> PropertySelector<T> for EnumerableSelector<T> {
    fn write_properties(
        &self,
        info: &TypeInfo<T>,
        resource: &T,
        cx: &mut WriteContext<'_>,
    ) -> Result<bool, WriteError> {
        let depth = cx.depth() - 1;
        loop {
            let cursor = cx.members_cursor()?;
            if matches!(cursor, Cursor::NotStarted) {
                *cursor = Cursor::Enumerator(Box::new(LiveEnumerator {
                    names: (self.source)(resource),
                    current: None,
                    seen: vec![false; info.len()],
                    pending: None,
                }));
            }
            let live = match cursor {
                Cursor::Enumerator(live) => live
                    .downcast_mut::<LiveEnumerator>()
                    .ok_or(WriteError::StaleFrame(depth))?,
                Cursor::Done => return Ok(true),
                Cursor::NotStarted | Cursor::Index(_) => return Err(WriteError::StaleFrame(depth)),
            };

            let index = match live.current {
                Some(index) => index,
                None => {
                    let name = match live.pending.take() {
                        Some(name) => name,
                        None => match live.names.next() {
                            Some(name) => name,
                            None => {
                                *cx.members_cursor()? = Cursor::Done;
                                return Ok(true);
                            }
                        },
                    };
                    let index = match info.index_of(&name) {
                        Some(index) if !live.seen[index] => index,
                        found => {
                            let err = match found {
                                None => WriteError::UnknownProperty {
                                    type_name: info.type_name(),
                                    name: Box::from(&*name),
                                },
                                Some(_) => MetaError::DuplicateProperty {
                                    type_name: info.type_name(),
                                    name: Box::from(&*name),
                                }
                                .into(),
                            };
                            live.pending = Some(name);
                            return Err(err);
                        }
                    };
                    live.current = Some(index);
                    index
                }
            };

            if !cx.write_member(info, index, resource)? {
                return Ok(false);
            }

            if let Cursor::Enumerator(live) = cx.members_cursor()?
                && let Some(live) = live.downcast_mut::<LiveEnumerator>()
            {
                live.seen[index] = true;
                live.current = None;
            }
        }
    }
}

use core::fmt;
use core::mem;

use crate::sink::{OutputSink, Scalar};
use crate::{MetaError, WriteError};

// -----------------------------------------------------------------------------
// Kind, position and mask

/// The annotations a resource or a property may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Count,
    NextLink,
    ETag,
}

impl AnnotationKind {
    /// All kinds in emission order.
    pub const ALL: [AnnotationKind; 3] = [Self::Count, Self::NextLink, Self::ETag];

    /// The wire term, without the leading `@`.
    pub const fn term(self) -> &'static str {
        match self {
            Self::Count => "odata.count",
            Self::NextLink => "odata.nextLink",
            Self::ETag => "odata.etag",
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mask(self) -> AnnotationMask {
        match self {
            Self::Count => AnnotationMask::COUNT,
            Self::NextLink => AnnotationMask::NEXT_LINK,
            Self::ETag => AnnotationMask::ETAG,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.term())
    }
}

/// Where a property's annotations are written relative to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationPosition {
    /// Resolves to [`PreValue`](Self::PreValue).
    #[default]
    Auto,
    PreValue,
    PostValue,
}

impl AnnotationPosition {
    #[inline]
    pub const fn is_pre_value(self) -> bool {
        !matches!(self, Self::PostValue)
    }
}

bitflags::bitflags! {
    /// A set of [`AnnotationKind`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AnnotationMask: u8 {
        const COUNT = 1;
        const NEXT_LINK = 1 << 1;
        const ETAG = 1 << 2;
    }
}

// -----------------------------------------------------------------------------
// Accessors

/// A value produced by an [`AnnotationAccessor::Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Count(u64),
    Text(String),
}

/// How the value of one annotation is obtained from a resource of type `T`.
pub enum AnnotationAccessor<T> {
    /// Returns the value, or `None` to omit the annotation.
    Value(fn(&T) -> Option<AnnotationValue>),
    /// Writes the value itself. Not writing omits the annotation.
    Writer(fn(&T, AnnotationWriter<'_>) -> Result<(), WriteError>),
}

impl<T> Clone for AnnotationAccessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AnnotationAccessor<T> {}

impl<T> fmt::Debug for AnnotationAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("AnnotationAccessor::Value"),
            Self::Writer(_) => f.write_str("AnnotationAccessor::Writer"),
        }
    }
}

/// At most one accessor per [`AnnotationKind`].
pub struct AnnotationSet<T> {
    slots: [Option<AnnotationAccessor<T>>; 3],
}

impl<T> AnnotationSet<T> {
    pub const fn new() -> Self {
        Self { slots: [None; 3] }
    }

    /// Sets the accessor for `kind`.
    ///
    /// Replacing an accessor with one of the same form is allowed; mixing a
    /// value accessor and a writer accessor for one kind is not.
    pub fn insert(
        &mut self,
        kind: AnnotationKind,
        accessor: AnnotationAccessor<T>,
        owner: &str,
    ) -> Result<(), MetaError> {
        let slot = &mut self.slots[kind.index()];
        if let Some(existing) = slot
            && mem::discriminant(existing) != mem::discriminant(&accessor)
        {
            return Err(MetaError::ConflictingAnnotationAccessor {
                owner: owner.into(),
                annotation: kind,
            });
        }
        *slot = Some(accessor);
        Ok(())
    }

    #[inline]
    pub fn get(&self, kind: AnnotationKind) -> Option<&AnnotationAccessor<T>> {
        self.slots[kind.index()].as_ref()
    }

    pub fn mask(&self) -> AnnotationMask {
        AnnotationKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .fold(AnnotationMask::empty(), |mask, kind| mask | kind.mask())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl<T> Default for AnnotationSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AnnotationSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(AnnotationKind::ALL.into_iter().filter(|kind| self.get(*kind).is_some()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Writer

/// Writes the value of a single annotation.
///
/// Every write method consumes the writer, so an accessor can emit at most
/// one value. The annotation name is written together with the value.
pub struct AnnotationWriter<'w> {
    sink: &'w mut (dyn OutputSink + 'w),
    target: Option<&'w str>,
    kind: AnnotationKind,
}

impl<'w> AnnotationWriter<'w> {
    pub(crate) fn new(
        sink: &'w mut (dyn OutputSink + 'w),
        target: Option<&'w str>,
        kind: AnnotationKind,
    ) -> Self {
        Self { sink, target, kind }
    }

    #[inline]
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// The annotated property, `None` for resource-level annotations.
    #[inline]
    pub fn target(&self) -> Option<&str> {
        self.target
    }

    pub fn write_count(self, count: u64) -> Result<(), WriteError> {
        if self.kind != AnnotationKind::Count {
            return Err(WriteError::AnnotationKindMismatch {
                kind: self.kind,
                attempted: "count",
            });
        }
        self.sink.write_annotation_name(self.target, self.kind.term())?;
        self.sink.write_scalar(Scalar::UInt(count))?;
        Ok(())
    }

    pub fn write_text(self, text: &str) -> Result<(), WriteError> {
        if self.kind == AnnotationKind::Count {
            return Err(WriteError::AnnotationKindMismatch {
                kind: self.kind,
                attempted: "text",
            });
        }
        self.sink.write_annotation_name(self.target, self.kind.term())?;
        self.sink.write_scalar(Scalar::Str(text))?;
        Ok(())
    }

    pub fn write(self, value: &AnnotationValue) -> Result<(), WriteError> {
        match value {
            AnnotationValue::Count(count) => self.write_count(*count),
            AnnotationValue::Text(text) => self.write_text(text),
        }
    }
}

pub(crate) fn write_annotation<T>(
    accessor: &AnnotationAccessor<T>,
    resource: &T,
    target: Option<&str>,
    kind: AnnotationKind,
    sink: &mut dyn OutputSink,
) -> Result<(), WriteError> {
    match accessor {
        AnnotationAccessor::Value(get) => match get(resource) {
            Some(value) => AnnotationWriter::new(sink, target, kind).write(&value),
            None => Ok(()),
        },
        AnnotationAccessor::Writer(write) => write(resource, AnnotationWriter::new(sink, target, kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::JsonSink;

    struct Page {
        total: u64,
        next: Option<&'static str>,
    }

    fn count(page: &Page) -> Option<AnnotationValue> {
        Some(AnnotationValue::Count(page.total))
    }

    fn next_link(page: &Page, writer: AnnotationWriter<'_>) -> Result<(), WriteError> {
        match page.next {
            Some(link) => writer.write_text(link),
            None => Ok(()),
        }
    }

    fn wrong_kind(_: &Page, writer: AnnotationWriter<'_>) -> Result<(), WriteError> {
        writer.write_count(1)
    }

    fn render(f: impl FnOnce(&mut JsonSink<Vec<u8>>)) -> String {
        let mut sink = JsonSink::new(Vec::<u8>::new(), 1024);
        sink.begin_object().unwrap();
        f(&mut sink);
        sink.end_object().unwrap();
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn terms() {
        assert_eq!(AnnotationKind::Count.term(), "odata.count");
        assert_eq!(AnnotationKind::NextLink.to_string(), "odata.nextLink");
        assert_eq!(AnnotationKind::ETag.mask(), AnnotationMask::ETAG);
        assert!(AnnotationPosition::Auto.is_pre_value());
        assert!(!AnnotationPosition::PostValue.is_pre_value());
    }

    #[test]
    fn conflicting_accessors() {
        let mut set = AnnotationSet::<Page>::new();
        set.insert(AnnotationKind::Count, AnnotationAccessor::Value(count), "Items")
            .unwrap();
        set.insert(AnnotationKind::Count, AnnotationAccessor::Value(count), "Items")
            .unwrap();

        let err = set
            .insert(AnnotationKind::Count, AnnotationAccessor::Writer(wrong_kind), "Items")
            .unwrap_err();
        assert_eq!(
            err,
            MetaError::ConflictingAnnotationAccessor {
                owner: "Items".into(),
                annotation: AnnotationKind::Count,
            }
        );
        assert_eq!(set.mask(), AnnotationMask::COUNT);
    }

    #[test]
    fn value_and_writer_output() {
        let page = Page {
            total: 3,
            next: Some("p2"),
        };
        let json = render(|sink| {
            let count = AnnotationAccessor::Value(count);
            write_annotation(&count, &page, Some("Items"), AnnotationKind::Count, sink).unwrap();
            let next = AnnotationAccessor::Writer(next_link);
            write_annotation(&next, &page, None, AnnotationKind::NextLink, sink).unwrap();
        });
        assert_eq!(json, r#"{"Items@odata.count":3,"@odata.nextLink":"p2"}"#);
    }

    #[test]
    fn writer_may_omit() {
        let page = Page {
            total: 0,
            next: None,
        };
        let json = render(|sink| {
            let next = AnnotationAccessor::Writer(next_link);
            write_annotation(&next, &page, None, AnnotationKind::NextLink, sink).unwrap();
        });
        assert_eq!(json, "{}");
    }

    #[test]
    fn kind_mismatch() {
        let page = Page {
            total: 0,
            next: None,
        };
        let mut sink = JsonSink::new(Vec::<u8>::new(), 64);
        let accessor = AnnotationAccessor::Writer(wrong_kind);
        let err = write_annotation(&accessor, &page, None, AnnotationKind::ETag, &mut sink)
            .unwrap_err();
        assert!(matches!(
            err,
            WriteError::AnnotationKindMismatch {
                kind: AnnotationKind::ETag,
                attempted: "count"
            }
        ));
    }
}

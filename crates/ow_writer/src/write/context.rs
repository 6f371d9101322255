use core::mem;

use crate::info::{AnnotationKind, AnnotationMask, EncodedName, MemberInfo, Resource, TypeInfo};
use crate::info::write_annotation;
use crate::registry::MetadataFactory;
use crate::resolve::{EntryTarget, HandlerResolver};
use crate::sink::{OutputSink, Scalar};
use crate::state::{ChunkFrame, CollectionFrame, Cursor, EntriesFrame, Frame, FrameKind};
use crate::state::{MemberProgress, ResourceFrame, WriteState};
use crate::value::{ValueKind, WriteValue};
use crate::write::{WriterOptions, write_resource_body};
use crate::{MetaError, WriteError};

/// The environment of one write call.
///
/// Passed to every [`WriteValue`] and [`PropertySelector`](crate::select::PropertySelector).
/// Values that may suspend keep their progress in a frame at the current
/// depth, see the resumable helpers [`write_text`](Self::write_text),
/// [`write_binary`](Self::write_binary), [`write_sequence`](Self::write_sequence),
/// [`write_entries`](Self::write_entries) and [`write_nested`](Self::write_nested).
pub struct WriteContext<'a> {
    state: &'a mut WriteState,
    sink: &'a mut (dyn OutputSink + 'a),
    factory: &'a MetadataFactory,
    resolver: &'a HandlerResolver,
    options: &'a WriterOptions,
    depth: usize,
    suppress_next: AnnotationMask,
}

macro_rules! frame_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub(crate) fn $name(&mut self) -> Result<&mut $ty, WriteError> {
            let depth = self.depth.saturating_sub(1);
            match self.frame_mut()? {
                Frame::$variant(frame) => Ok(frame),
                other => Err(WriteError::FrameMismatch {
                    depth,
                    expected: FrameKind::$variant.name(),
                    found: other.kind().name(),
                }),
            }
        }
    };
}

impl<'a> WriteContext<'a> {
    pub(crate) fn new(
        state: &'a mut WriteState,
        sink: &'a mut (dyn OutputSink + 'a),
        factory: &'a MetadataFactory,
        resolver: &'a HandlerResolver,
        options: &'a WriterOptions,
    ) -> Self {
        Self {
            state,
            sink,
            factory,
            resolver,
            options,
            depth: 0,
            suppress_next: AnnotationMask::empty(),
        }
    }

    #[inline]
    pub fn sink(&mut self) -> &mut (dyn OutputSink + 'a) {
        &mut *self.sink
    }

    #[inline]
    pub fn should_suspend(&self) -> bool {
        self.sink.should_suspend()
    }

    #[inline]
    pub fn factory(&self) -> &'a MetadataFactory {
        self.factory
    }

    #[inline]
    pub fn resolver(&self) -> &'a HandlerResolver {
        self.resolver
    }

    #[inline]
    pub fn options(&self) -> &'a WriterOptions {
        self.options
    }

    /// Number of levels entered so far in this call.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    // -------------------------------------------------------------------------
    // Resumable values

    /// Writes a resource nested in the current value.
    pub fn write_nested<T: Resource>(&mut self, resource: &T) -> Result<bool, WriteError> {
        let info = self.factory.create_type_info::<T>()?;
        write_resource_body(info, None, resource, self)
    }

    /// Writes a string, in segments if it does not fit in the sink.
    ///
    /// Text that is short once escaped, or that fits in the remaining space,
    /// is written whole.
    pub fn write_text(&mut self, text: &str) -> Result<bool, WriteError> {
        if !self.has_frame_here() && self.fits_whole(text) {
            self.sink.write_scalar(Scalar::Str(text))?;
            return Ok(true);
        }

        self.enter(FrameKind::Chunk, |_| Frame::Chunk(ChunkFrame::default()))?;
        loop {
            let frame = self.chunk_frame()?;
            let (started, offset) = (frame.started, frame.offset);
            if !started {
                self.sink.begin_text()?;
                self.chunk_frame()?.started = true;
                continue;
            }
            if offset >= text.len() {
                self.sink.end_text()?;
                self.leave(true);
                return Ok(true);
            }
            if self.should_suspend() {
                self.leave(false);
                return Ok(false);
            }

            let budget = self.segment_budget(self.sink.remaining());
            let rest = text
                .get(offset..)
                .ok_or(WriteError::StaleFrame(self.depth - 1))?;
            let sink = &*self.sink;
            let len = text_segment_len(rest, budget, |part| sink.text_len(part));
            self.sink.write_text_segment(&rest[..len])?;
            self.chunk_frame()?.offset = offset + len;
        }
    }

    /// Writes bytes as a binary value, in segments if they do not fit in the sink.
    pub fn write_binary(&mut self, bytes: &[u8]) -> Result<bool, WriteError> {
        if !self.has_frame_here() && encoded_len(bytes.len()) + 2 <= self.sink.remaining() {
            self.sink.begin_binary()?;
            self.sink.write_binary_segment(bytes)?;
            self.sink.end_binary()?;
            return Ok(true);
        }

        self.enter(FrameKind::Chunk, |_| Frame::Chunk(ChunkFrame::default()))?;
        loop {
            let frame = self.chunk_frame()?;
            let (started, offset) = (frame.started, frame.offset);
            if !started {
                self.sink.begin_binary()?;
                self.chunk_frame()?.started = true;
                continue;
            }
            if offset >= bytes.len() {
                self.sink.end_binary()?;
                self.leave(true);
                return Ok(true);
            }
            if self.should_suspend() {
                self.leave(false);
                return Ok(false);
            }

            // Four output bytes per three input bytes.
            let budget = self.segment_budget(self.sink.remaining() / 4 * 3);
            let end = (offset + budget).min(bytes.len());
            self.sink.write_binary_segment(&bytes[offset..end])?;
            self.chunk_frame()?.offset = end;
        }
    }

    /// Writes the items returned by `item(0)`, `item(1)`, ... as an array,
    /// stopping at the first `None`.
    pub fn write_sequence<'v, V>(
        &mut self,
        item: impl Fn(usize) -> Option<&'v V>,
    ) -> Result<bool, WriteError>
    where
        V: WriteValue + ?Sized + 'v,
    {
        self.enter(FrameKind::Collection, |_| {
            Frame::Collection(CollectionFrame::default())
        })?;
        loop {
            let frame = self.collection_frame()?;
            let (started, next, item_started) = (frame.started, frame.next, frame.item_started);
            if !started {
                self.sink.begin_array()?;
                self.collection_frame()?.started = true;
                continue;
            }

            let Some(value) = item(next) else {
                self.sink.end_array()?;
                self.leave(true);
                return Ok(true);
            };

            if !item_started {
                if self.should_suspend() {
                    self.leave(false);
                    return Ok(false);
                }
                self.collection_frame()?.item_started = true;
            }

            if !value.write_value(self)? {
                self.leave(false);
                return Ok(false);
            }

            let frame = self.collection_frame()?;
            frame.next += 1;
            frame.item_started = false;
        }
    }

    /// Writes `(name, value)` pairs as members of the enclosing object.
    ///
    /// `entries` must yield the same sequence on every call of one write.
    pub fn write_entries<'v, V, I>(&mut self, entries: I, target: EntryTarget) -> Result<bool, WriteError>
    where
        V: WriteValue + ?Sized + 'v,
        I: Iterator<Item = (&'v str, &'v V)>,
    {
        self.write_entry_sequence(entries, target, false)
    }

    /// Writes `(name, value)` pairs as a JSON object of their own.
    pub fn write_object<'v, V, I>(&mut self, entries: I) -> Result<bool, WriteError>
    where
        V: WriteValue + ?Sized + 'v,
        I: Iterator<Item = (&'v str, &'v V)>,
    {
        self.write_entry_sequence(entries, EntryTarget::OpenProperty, true)
    }

    fn write_entry_sequence<'v, V, I>(
        &mut self,
        entries: I,
        target: EntryTarget,
        wrap: bool,
    ) -> Result<bool, WriteError>
    where
        V: WriteValue + ?Sized + 'v,
        I: Iterator<Item = (&'v str, &'v V)>,
    {
        self.enter(FrameKind::Entries, |_| Frame::Entries(EntriesFrame::default()))?;

        let frame = self.entries_frame()?;
        let (started, next) = (frame.started, frame.next);
        if !started {
            if wrap {
                self.sink.begin_object()?;
            }
            self.entries_frame()?.started = true;
        }

        let mut entries = entries.skip(next);
        loop {
            let Some((name, value)) = entries.next() else {
                if wrap {
                    self.sink.end_object()?;
                }
                self.leave(true);
                return Ok(true);
            };

            if !self.write_entry(name, value, target)? {
                self.leave(false);
                return Ok(false);
            }

            let frame = self.entries_frame()?;
            frame.next += 1;
            frame.progress = MemberProgress::NotStarted;
        }
    }

    fn write_entry<V>(&mut self, name: &str, value: &V, target: EntryTarget) -> Result<bool, WriteError>
    where
        V: WriteValue + ?Sized,
    {
        loop {
            let next = match self.progress()? {
                MemberProgress::NotStarted => {
                    if self.should_suspend() {
                        return Ok(false);
                    }
                    match target {
                        EntryTarget::OpenProperty => self.sink.write_dynamic_name(name)?,
                        EntryTarget::Annotation => self.sink.write_annotation_name(None, name)?,
                    }
                    MemberProgress::NameWritten
                }
                MemberProgress::NameWritten | MemberProgress::ValueInProgress => {
                    self.set_progress(MemberProgress::ValueInProgress)?;
                    if !value.write_value(self)? {
                        return Ok(false);
                    }
                    MemberProgress::Complete
                }
                MemberProgress::Complete => return Ok(true),
                MemberProgress::PreAnnotations(_) | MemberProgress::PostAnnotations(_) => {
                    return Err(WriteError::StaleFrame(self.depth - 1));
                }
            };
            self.set_progress(next)?;
        }
    }

    // -------------------------------------------------------------------------
    // Members

    /// Writes the member at `index` of the resource in the current frame.
    ///
    /// Returns `Ok(true)` once the member is complete or skipped; the member
    /// progress is then reset for the next member.
    pub fn write_member<T: 'static>(
        &mut self,
        info: &TypeInfo<T>,
        index: usize,
        resource: &T,
    ) -> Result<bool, WriteError> {
        let member = info.member(index).ok_or(WriteError::UnknownProperty {
            type_name: info.type_name(),
            name: format!("#{index}").into_boxed_str(),
        })?;
        let name = member.name().ok_or(MetaError::UnnamedProperty {
            type_name: info.type_name(),
            index,
        })?;
        let pre_value = member.annotation_position().is_pre_value();

        loop {
            let next = match self.progress()? {
                MemberProgress::NotStarted => {
                    if self.should_suspend() {
                        return Ok(false);
                    }
                    if member.should_skip(resource) {
                        MemberProgress::Complete
                    } else if pre_value {
                        MemberProgress::PreAnnotations(0)
                    } else {
                        self.sink.write_name(name)?;
                        MemberProgress::NameWritten
                    }
                }
                MemberProgress::PreAnnotations(slot) => match AnnotationKind::ALL.get(slot as usize) {
                    Some(&kind) => {
                        if !self.write_member_annotation(member, name, kind, resource)? {
                            return Ok(false);
                        }
                        MemberProgress::PreAnnotations(slot + 1)
                    }
                    None => {
                        self.sink.write_name(name)?;
                        MemberProgress::NameWritten
                    }
                },
                MemberProgress::NameWritten | MemberProgress::ValueInProgress => {
                    self.set_progress(MemberProgress::ValueInProgress)?;
                    if member.value_kind() == ValueKind::Resource {
                        self.suppress_next = member.annotations().mask();
                    }
                    let done = member.write_value(resource, self);
                    self.suppress_next = AnnotationMask::empty();
                    if !done? {
                        return Ok(false);
                    }
                    if pre_value {
                        MemberProgress::Complete
                    } else {
                        MemberProgress::PostAnnotations(0)
                    }
                }
                MemberProgress::PostAnnotations(slot) => match AnnotationKind::ALL.get(slot as usize) {
                    Some(&kind) => {
                        if !self.write_member_annotation(member, name, kind, resource)? {
                            return Ok(false);
                        }
                        MemberProgress::PostAnnotations(slot + 1)
                    }
                    None => MemberProgress::Complete,
                },
                MemberProgress::Complete => {
                    self.set_progress(MemberProgress::NotStarted)?;
                    return Ok(true);
                }
            };
            self.set_progress(next)?;
        }
    }

    fn write_member_annotation<T: 'static>(
        &mut self,
        member: &dyn MemberInfo<T>,
        name: &EncodedName,
        kind: AnnotationKind,
        resource: &T,
    ) -> Result<bool, WriteError> {
        let Some(accessor) = member.annotations().get(kind) else {
            return Ok(true);
        };
        if self.should_suspend() {
            return Ok(false);
        }
        write_annotation(accessor, resource, Some(name.as_str()), kind, &mut *self.sink)?;
        Ok(true)
    }

    /// The selector cursor of the resource in the current frame.
    pub fn members_cursor(&mut self) -> Result<&mut Cursor, WriteError> {
        Ok(&mut self.resource_frame()?.members)
    }

    /// The progress of the member or entry in the current frame.
    pub fn progress(&mut self) -> Result<MemberProgress, WriteError> {
        Ok(*self.progress_mut()?)
    }

    pub(crate) fn set_progress(&mut self, progress: MemberProgress) -> Result<(), WriteError> {
        *self.progress_mut()? = progress;
        Ok(())
    }

    fn progress_mut(&mut self) -> Result<&mut MemberProgress, WriteError> {
        let depth = self.depth.saturating_sub(1);
        let frame = self.frame_mut()?;
        let found = frame.kind().name();
        frame.progress_mut().ok_or(WriteError::FrameMismatch {
            depth,
            expected: FrameKind::Resource.name(),
            found,
        })
    }

    // -------------------------------------------------------------------------
    // Frames

    /// Descends one level, reusing the stored frame or creating one with `init`.
    ///
    /// `init` receives the annotations the enclosing property already wrote.
    pub(crate) fn enter(
        &mut self,
        kind: FrameKind,
        init: impl FnOnce(AnnotationMask) -> Frame,
    ) -> Result<(), WriteError> {
        let suppressed = mem::take(&mut self.suppress_next);
        if self.depth >= self.options.max_depth {
            return Err(WriteError::DepthExceeded(self.options.max_depth));
        }

        match self.state.get(self.depth) {
            Some(frame) if frame.kind() == kind => {
                log::trace!("resuming {} frame at depth {}", kind.name(), self.depth);
            }
            Some(frame) => {
                return Err(WriteError::FrameMismatch {
                    depth: self.depth,
                    expected: kind.name(),
                    found: frame.kind().name(),
                });
            }
            None if self.state.depth() == self.depth => self.state.push(init(suppressed)),
            None => return Err(WriteError::MissingFrame(self.depth)),
        }
        self.depth += 1;
        Ok(())
    }

    /// Ascends one level, dropping the frame if the level is complete.
    pub(crate) fn leave(&mut self, complete: bool) {
        self.depth -= 1;
        if complete {
            self.state.truncate(self.depth);
        }
    }

    /// Returns `true` if a suspended value left a frame at the current depth.
    #[inline]
    pub(crate) fn has_frame_here(&self) -> bool {
        self.state.depth() > self.depth
    }

    fn frame_mut(&mut self) -> Result<&mut Frame, WriteError> {
        let depth = self.depth.checked_sub(1).ok_or(WriteError::MissingFrame(0))?;
        self.state.get_mut(depth).ok_or(WriteError::MissingFrame(depth))
    }

    frame_accessor!(resource_frame, Resource, ResourceFrame);
    frame_accessor!(collection_frame, Collection, CollectionFrame);
    frame_accessor!(chunk_frame, Chunk, ChunkFrame);
    frame_accessor!(entries_frame, Entries, EntriesFrame);

    fn fits_whole(&self, text: &str) -> bool {
        let len = self.sink.text_len(text).saturating_add(2);
        len <= self.options.atomic_text_limit || len <= self.sink.remaining()
    }

    fn segment_budget(&self, available: usize) -> usize {
        available.clamp(1, self.options.text_chunk_limit.max(1))
    }
}

/// Byte length of the next text segment: whole characters whose escaped
/// length stays within `budget`, and at least one character.
fn text_segment_len(rest: &str, budget: usize, escaped: impl Fn(&str) -> usize) -> usize {
    let mut buf = [0; 4];
    let (mut len, mut used) = (0, 0);
    for ch in rest.chars() {
        let cost = escaped(ch.encode_utf8(&mut buf));
        if len > 0 && used + cost > budget {
            break;
        }
        len += ch.len_utf8();
        used += cost;
    }
    len
}

#[inline]
const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

use core::any::Any;
use core::fmt;

use crate::info::AnnotationMask;

// -----------------------------------------------------------------------------
// Frame

/// Progress of one nesting level.
#[derive(Debug)]
pub enum Frame {
    Resource(ResourceFrame),
    Collection(CollectionFrame),
    Chunk(ChunkFrame),
    Entries(EntriesFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Resource,
    Collection,
    Chunk,
    Entries,
}

impl FrameKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Collection => "collection",
            Self::Chunk => "chunk",
            Self::Entries => "entries",
        }
    }
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Resource(_) => FrameKind::Resource,
            Self::Collection(_) => FrameKind::Collection,
            Self::Chunk(_) => FrameKind::Chunk,
            Self::Entries(_) => FrameKind::Entries,
        }
    }

    /// The member progress of frames that write named members.
    pub(crate) fn progress_mut(&mut self) -> Option<&mut MemberProgress> {
        match self {
            Self::Resource(frame) => Some(&mut frame.progress),
            Self::Entries(frame) => Some(&mut frame.progress),
            Self::Collection(_) | Self::Chunk(_) => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(frame) => f.write_str(frame.type_name),
            Self::Collection(frame) => write!(f, "[{}]", frame.next),
            Self::Chunk(frame) => write!(f, "chunk@{}", frame.offset),
            Self::Entries(frame) => write!(f, "entries[{}]", frame.next),
        }
    }
}

// -----------------------------------------------------------------------------
// Resource

/// Stages of a resource, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStage {
    NotStarted,
    /// Resource-level annotations; the value is the next annotation slot.
    Annotations(u8),
    CustomAnnotations,
    Members,
    DynamicMembers,
    Complete,
}

/// Progress within one named member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberProgress {
    NotStarted,
    /// Annotations written before the name; the value is the next slot.
    PreAnnotations(u8),
    NameWritten,
    ValueInProgress,
    /// Annotations written after the value; the value is the next slot.
    PostAnnotations(u8),
    Complete,
}

/// Position in the property sequence chosen by a selector.
pub enum Cursor {
    NotStarted,
    Index(usize),
    /// A live enumerator owned by the frame, recovered by downcast.
    Enumerator(Box<dyn Any + Send>),
    Done,
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("NotStarted"),
            Self::Index(index) => f.debug_tuple("Index").field(index).finish(),
            Self::Enumerator(_) => f.write_str("Enumerator(..)"),
            Self::Done => f.write_str("Done"),
        }
    }
}

#[derive(Debug)]
pub struct ResourceFrame {
    pub(crate) type_name: &'static str,
    pub(crate) stage: ResourceStage,
    pub(crate) members: Cursor,
    pub(crate) progress: MemberProgress,
    /// Resource-level annotations already written by the enclosing property.
    pub(crate) suppressed: AnnotationMask,
}

impl ResourceFrame {
    pub(crate) fn new(type_name: &'static str, suppressed: AnnotationMask) -> Self {
        Self {
            type_name,
            stage: ResourceStage::NotStarted,
            members: Cursor::NotStarted,
            progress: MemberProgress::NotStarted,
            suppressed,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn stage(&self) -> ResourceStage {
        self.stage
    }

    #[inline]
    pub fn progress(&self) -> MemberProgress {
        self.progress
    }
}

// -----------------------------------------------------------------------------
// Others

#[derive(Debug, Default)]
pub struct CollectionFrame {
    pub(crate) started: bool,
    pub(crate) next: usize,
    pub(crate) item_started: bool,
}

impl CollectionFrame {
    /// Index of the item being written.
    #[inline]
    pub fn next(&self) -> usize {
        self.next
    }
}

/// A text or binary value written in segments.
#[derive(Debug, Default)]
pub struct ChunkFrame {
    pub(crate) started: bool,
    pub(crate) offset: usize,
}

impl ChunkFrame {
    /// Byte offset of the next segment.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[derive(Debug)]
pub struct EntriesFrame {
    pub(crate) started: bool,
    pub(crate) next: usize,
    pub(crate) progress: MemberProgress,
}

impl Default for EntriesFrame {
    fn default() -> Self {
        Self {
            started: false,
            next: 0,
            progress: MemberProgress::NotStarted,
        }
    }
}

impl EntriesFrame {
    /// Index of the entry being written.
    #[inline]
    pub fn next(&self) -> usize {
        self.next
    }

    #[inline]
    pub fn progress(&self) -> MemberProgress {
        self.progress
    }
}

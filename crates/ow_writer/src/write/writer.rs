use core::any::Any;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::info::Resource;
use crate::registry::MetadataFactory;
use crate::resolve::HandlerResolver;
use crate::select::PropertySelector;
use crate::sink::{AsyncOutputSink, FlushSink, OutputSink};
use crate::state::WriteState;
use crate::write::{WriteContext, write_resource_body};
use crate::WriteError;

// -----------------------------------------------------------------------------
// Options

/// Runtime limits of a [`ResourceWriter`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Deepest allowed nesting of resources, collections and containers.
    pub max_depth: usize,
    /// Upper bound, in bytes, of a single text or binary segment.
    pub text_chunk_limit: usize,
    /// Text whose escaped form is at most this many bytes is written whole,
    /// even into a full sink.
    pub atomic_text_limit: usize,
}

impl WriterOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_TEXT_CHUNK_LIMIT: usize = 8 * 1024;
    pub const DEFAULT_ATOMIC_TEXT_LIMIT: usize = 32;
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            text_chunk_limit: Self::DEFAULT_TEXT_CHUNK_LIMIT,
            atomic_text_limit: Self::DEFAULT_ATOMIC_TEXT_LIMIT,
        }
    }
}

// -----------------------------------------------------------------------------
// Cancellation

/// Cooperative cancellation of an async write.
///
/// Checked at every suspension point; a cancelled write discards its state
/// and returns [`WriteError::Cancelled`].
#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// -----------------------------------------------------------------------------
// ResourceWriter

/// Writes resources into an [`OutputSink`], suspending whenever the sink is full.
///
/// # Examples
///
/// ```
/// use ow_writer::{Resource, ResourceWriter, WriteState};
/// use ow_writer::sink::{FlushSink, JsonSink};
///
/// #[derive(Resource)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let writer = ResourceWriter::new();
/// let mut state = WriteState::new();
/// let mut sink = JsonSink::new(Vec::<u8>::new(), 1);
///
/// writer.write_to_end(&Point { x: 1, y: 2 }, &mut state, &mut sink).unwrap();
///
/// assert!(state.is_idle());
/// assert_eq!(sink.into_inner().unwrap(), br#"{"x":1,"y":2}"#);
/// ```
#[derive(Debug)]
pub struct ResourceWriter<'f> {
    factory: &'f MetadataFactory,
    resolver: HandlerResolver,
    options: WriterOptions,
}

impl ResourceWriter<'static> {
    /// A writer over the [shared factory](MetadataFactory::shared) with the
    /// default container handlers.
    pub fn new() -> Self {
        Self::with_factory(MetadataFactory::shared())
    }
}

impl Default for ResourceWriter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f> ResourceWriter<'f> {
    pub fn with_factory(factory: &'f MetadataFactory) -> Self {
        Self {
            factory,
            resolver: HandlerResolver::with_defaults(),
            options: WriterOptions::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: HandlerResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn factory(&self) -> &'f MetadataFactory {
        self.factory
    }

    #[inline]
    pub fn resolver(&self) -> &HandlerResolver {
        &self.resolver
    }

    #[inline]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Writes `resource`, or continues a write suspended earlier with the same `state`.
    ///
    /// Returns `Ok(true)` when the resource is complete and `Ok(false)` when
    /// the sink asked to suspend. After `Ok(false)`, drain the sink and call
    /// again with the same resource, state and sink.
    pub fn write_resource<T: Resource>(
        &self,
        resource: &T,
        state: &mut WriteState,
        sink: &mut dyn OutputSink,
    ) -> Result<bool, WriteError> {
        let info = self.factory.create_type_info::<T>()?;
        self.drive(state, sink, |cx| write_resource_body(info, None, resource, cx))
    }

    /// Like [`write_resource`](Self::write_resource), with `selector` choosing
    /// the top-level properties. Nested resources use their own selector.
    pub fn write_resource_with<T: Resource>(
        &self,
        resource: &T,
        selector: &dyn PropertySelector<T>,
        state: &mut WriteState,
        sink: &mut dyn OutputSink,
    ) -> Result<bool, WriteError> {
        let info = self.factory.create_type_info::<T>()?;
        self.drive(state, sink, |cx| {
            write_resource_body(info, Some(selector), resource, cx)
        })
    }

    /// Writes a resource only known as `dyn Any`.
    ///
    /// Its type must be built or registered in the factory.
    pub fn write_any(
        &self,
        resource: &dyn Any,
        state: &mut WriteState,
        sink: &mut dyn OutputSink,
    ) -> Result<bool, WriteError> {
        let info = self.factory.create_type_info_dyn(resource.type_id())?;
        self.drive(state, sink, |cx| info.write_any(resource, cx))
    }

    /// Writes `resource` completely, flushing the sink at every suspension.
    pub fn write_to_end<T: Resource, S: FlushSink>(
        &self,
        resource: &T,
        state: &mut WriteState,
        sink: &mut S,
    ) -> Result<(), WriteError> {
        loop {
            let done = self.write_resource(resource, state, sink)?;
            if let Err(err) = sink.flush() {
                let err = WriteError::from(err);
                state.poison(&err);
                return Err(err);
            }
            if done {
                return Ok(());
            }
        }
    }

    /// Writes `resource` completely, awaiting [`flush_async`](AsyncOutputSink::flush_async)
    /// at every suspension.
    ///
    /// `cancel` is checked before every call into the writer.
    pub async fn write_resource_async<T: Resource, S: AsyncOutputSink>(
        &self,
        resource: &T,
        state: &mut WriteState,
        sink: &mut S,
        cancel: &CancellationFlag,
    ) -> Result<(), WriteError> {
        loop {
            if cancel.is_cancelled() {
                log::warn!(
                    "write of `{}` cancelled at depth {}",
                    T::type_name(),
                    state.depth()
                );
                state.reset();
                return Err(WriteError::Cancelled);
            }

            let done = self.write_resource(resource, state, sink)?;
            if let Err(err) = sink.flush_async().await {
                let err = WriteError::from(err);
                state.poison(&err);
                return Err(err);
            }
            if done {
                return Ok(());
            }
        }
    }

    fn drive(
        &self,
        state: &mut WriteState,
        sink: &mut dyn OutputSink,
        write: impl FnOnce(&mut WriteContext<'_>) -> Result<bool, WriteError>,
    ) -> Result<bool, WriteError> {
        if state.is_poisoned() {
            return Err(WriteError::Poisoned);
        }

        let result = {
            let mut cx = WriteContext::new(state, sink, self.factory, &self.resolver, &self.options);
            write(&mut cx)
        };

        match result {
            Ok(true) => Ok(true),
            Ok(false) => {
                log::trace!("write suspended with {} stored frames", state.depth());
                Ok(false)
            }
            Err(err) => {
                if err.is_fatal() {
                    state.poison(&err);
                }
                Err(err)
            }
        }
    }
}

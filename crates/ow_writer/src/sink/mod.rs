//! The output side of a write.
//!
//! The writer emits structure and values through [`OutputSink`]. A sink
//! buffers output and reports through [`should_suspend`](OutputSink::should_suspend)
//! when its buffer is full; the writer then returns control and the caller
//! drains the buffer with [`FlushSink::flush`] or [`AsyncOutputSink::flush_async`].
//!
//! [`JsonSink`] is the JSON implementation.

mod json;

pub use json::JsonSink;

use core::future::Future;

use crate::SinkError;
use crate::info::EncodedName;

/// An atomic value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
}

/// Receives the structural events of a write.
///
/// Separators between members and items are the sink's concern.
pub trait OutputSink {
    /// Returns `true` when buffered output should be drained before more is written.
    fn should_suspend(&self) -> bool;

    /// Bytes that can be buffered before [`should_suspend`](Self::should_suspend) holds.
    fn remaining(&self) -> usize;

    fn begin_object(&mut self) -> Result<(), SinkError>;

    fn end_object(&mut self) -> Result<(), SinkError>;

    fn begin_array(&mut self) -> Result<(), SinkError>;

    fn end_array(&mut self) -> Result<(), SinkError>;

    /// Writes a declared property name.
    fn write_name(&mut self, name: &EncodedName) -> Result<(), SinkError>;

    /// Writes a name only known at write time, such as an open property.
    fn write_dynamic_name(&mut self, name: &str) -> Result<(), SinkError>;

    /// Writes `target@term`, or `@term` when `target` is `None`.
    fn write_annotation_name(&mut self, target: Option<&str>, term: &str) -> Result<(), SinkError>;

    fn write_scalar(&mut self, value: Scalar<'_>) -> Result<(), SinkError>;

    /// Bytes `text` occupies once escaped, without the surrounding quotes.
    fn text_len(&self, text: &str) -> usize;

    fn begin_text(&mut self) -> Result<(), SinkError>;

    /// Appends part of a text value. Segments never split a character.
    fn write_text_segment(&mut self, segment: &str) -> Result<(), SinkError>;

    fn end_text(&mut self) -> Result<(), SinkError>;

    fn begin_binary(&mut self) -> Result<(), SinkError>;

    /// Appends part of a binary value. Segments may have any length.
    fn write_binary_segment(&mut self, segment: &[u8]) -> Result<(), SinkError>;

    fn end_binary(&mut self) -> Result<(), SinkError>;
}

/// A sink drained synchronously.
pub trait FlushSink: OutputSink {
    fn flush(&mut self) -> Result<(), SinkError>;

    /// Flushes only if [`should_suspend`](OutputSink::should_suspend) holds.
    fn flush_if_full(&mut self) -> Result<bool, SinkError> {
        if self.should_suspend() {
            self.flush()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// A sink drained asynchronously.
pub trait AsyncOutputSink: OutputSink {
    fn flush_async(&mut self) -> impl Future<Output = Result<(), SinkError>>;

    fn flush_if_full_async(&mut self) -> impl Future<Output = Result<bool, SinkError>> {
        async move {
            if self.should_suspend() {
                self.flush_async().await?;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }
}

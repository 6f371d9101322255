use std::io;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_lite::io::{AsyncWrite, AsyncWriteExt};

use crate::SinkError;
use crate::info::EncodedName;
use crate::sink::{AsyncOutputSink, FlushSink, OutputSink, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    first: bool,
}

/// A JSON [`OutputSink`] over a bounded buffer.
///
/// Output accumulates in memory until the owner flushes it into `W`.
/// Binary values are base64 encoded; bytes that do not fill a 3-byte group
/// are held back until the next segment, so segmented binary encodes
/// exactly like the whole value.
///
/// # Examples
///
/// ```
/// use ow_writer::sink::{FlushSink, JsonSink, OutputSink, Scalar};
///
/// let mut sink = JsonSink::new(Vec::<u8>::new(), 64);
/// sink.begin_array().unwrap();
/// sink.write_scalar(Scalar::Int(1)).unwrap();
/// sink.write_scalar(Scalar::Str("a")).unwrap();
/// sink.end_array().unwrap();
///
/// assert_eq!(sink.into_inner().unwrap(), br#"[1,"a"]"#);
/// ```
pub struct JsonSink<W> {
    out: W,
    buffer: Vec<u8>,
    capacity: usize,
    scopes: Vec<Scope>,
    after_name: bool,
    carry: Vec<u8>,
}

impl<W> JsonSink<W> {
    pub const DEFAULT_CAPACITY: usize = 16 * 1024;

    /// Creates a sink that asks to be flushed once `capacity` bytes are buffered.
    pub fn new(out: W, capacity: usize) -> Self {
        Self {
            out,
            buffer: Vec::with_capacity(capacity),
            capacity,
            scopes: Vec::new(),
            after_name: false,
            carry: Vec::new(),
        }
    }

    /// Output written since the last flush.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn separator(&mut self) {
        if self.after_name {
            self.after_name = false;
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            if !scope.first {
                self.buffer.push(b',');
            }
            scope.first = false;
        }
    }

    fn open(&mut self, kind: ScopeKind, byte: u8) {
        self.separator();
        self.buffer.push(byte);
        self.scopes.push(Scope { kind, first: true });
    }

    fn close(&mut self, kind: ScopeKind, byte: u8) -> Result<(), SinkError> {
        match self.scopes.pop() {
            Some(scope) if scope.kind == kind => {
                self.buffer.push(byte);
                Ok(())
            }
            Some(_) => Err(SinkError::Unbalanced("closing scope does not match the open one")),
            None => Err(SinkError::Unbalanced("no open scope to close")),
        }
    }

    fn name_separator(&mut self) {
        self.buffer.push(b':');
        self.after_name = true;
    }
}

impl<W: io::Write> JsonSink<W> {
    /// Flushes the remaining output and returns the writer.
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        FlushSink::flush(&mut self)?;
        Ok(self.out)
    }
}

impl<W> OutputSink for JsonSink<W> {
    #[inline]
    fn should_suspend(&self) -> bool {
        !self.buffer.is_empty() && self.buffer.len() >= self.capacity
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.buffer.len())
    }

    fn begin_object(&mut self) -> Result<(), SinkError> {
        self.open(ScopeKind::Object, b'{');
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), SinkError> {
        self.close(ScopeKind::Object, b'}')
    }

    fn begin_array(&mut self) -> Result<(), SinkError> {
        self.open(ScopeKind::Array, b'[');
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), SinkError> {
        self.close(ScopeKind::Array, b']')
    }

    fn write_name(&mut self, name: &EncodedName) -> Result<(), SinkError> {
        self.separator();
        self.buffer.extend_from_slice(name.encoded());
        self.name_separator();
        Ok(())
    }

    fn write_dynamic_name(&mut self, name: &str) -> Result<(), SinkError> {
        self.separator();
        serde_json::to_writer(&mut self.buffer, name)?;
        self.name_separator();
        Ok(())
    }

    fn write_annotation_name(&mut self, target: Option<&str>, term: &str) -> Result<(), SinkError> {
        self.separator();
        let name = match target {
            Some(target) => format!("{target}@{term}"),
            None => format!("@{term}"),
        };
        serde_json::to_writer(&mut self.buffer, &name)?;
        self.name_separator();
        Ok(())
    }

    fn write_scalar(&mut self, value: Scalar<'_>) -> Result<(), SinkError> {
        self.separator();
        match value {
            Scalar::Null => self.buffer.extend_from_slice(b"null"),
            Scalar::Bool(value) => serde_json::to_writer(&mut self.buffer, &value)?,
            Scalar::Int(value) => serde_json::to_writer(&mut self.buffer, &value)?,
            Scalar::UInt(value) => serde_json::to_writer(&mut self.buffer, &value)?,
            Scalar::Float(value) => serde_json::to_writer(&mut self.buffer, &value)?,
            Scalar::Str(value) => serde_json::to_writer(&mut self.buffer, value)?,
        }
        Ok(())
    }

    fn text_len(&self, text: &str) -> usize {
        text.bytes().map(escaped_len).sum()
    }

    fn begin_text(&mut self) -> Result<(), SinkError> {
        self.separator();
        self.buffer.push(b'"');
        Ok(())
    }

    fn write_text_segment(&mut self, segment: &str) -> Result<(), SinkError> {
        let quoted = serde_json::to_string(segment)?;
        // Strip the surrounding quotes.
        self.buffer
            .extend_from_slice(&quoted.as_bytes()[1..quoted.len() - 1]);
        Ok(())
    }

    fn end_text(&mut self) -> Result<(), SinkError> {
        self.buffer.push(b'"');
        Ok(())
    }

    fn begin_binary(&mut self) -> Result<(), SinkError> {
        self.separator();
        self.buffer.push(b'"');
        self.carry.clear();
        Ok(())
    }

    fn write_binary_segment(&mut self, segment: &[u8]) -> Result<(), SinkError> {
        self.carry.extend_from_slice(segment);
        let whole = self.carry.len() / 3 * 3;
        if whole > 0 {
            let encoded = STANDARD.encode(&self.carry[..whole]);
            self.buffer.extend_from_slice(encoded.as_bytes());
            self.carry.drain(..whole);
        }
        Ok(())
    }

    fn end_binary(&mut self) -> Result<(), SinkError> {
        if !self.carry.is_empty() {
            let encoded = STANDARD.encode(&self.carry);
            self.buffer.extend_from_slice(encoded.as_bytes());
            self.carry.clear();
        }
        self.buffer.push(b'"');
        Ok(())
    }
}

impl<W: io::Write> FlushSink for JsonSink<W> {
    fn flush(&mut self) -> Result<(), SinkError> {
        self.out.write_all(&self.buffer)?;
        self.out.flush()?;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin> AsyncOutputSink for JsonSink<W> {
    async fn flush_async(&mut self) -> Result<(), SinkError> {
        self.out.write_all(&self.buffer).await?;
        self.out.flush().await?;
        self.buffer.clear();
        Ok(())
    }
}

/// Length of `byte` as `serde_json` escapes it inside a string.
fn escaped_len(byte: u8) -> usize {
    match byte {
        b'"' | b'\\' | b'\n' | b'\r' | b'\t' | 0x08 | 0x0C => 2,
        0x00..=0x1F => 6,
        _ => 1,
    }
}

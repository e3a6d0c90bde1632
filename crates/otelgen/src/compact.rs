//! Compact fixed-layout span buffer.
//!
//! A flat little-endian layout for span-only batches, cheaper to build and
//! scan than the structured encodings:
//!
//! ```text
//! u32 span_count
//! span_count × {
//!     [u8; 16] trace_id
//!     [u8; 8]  span_id
//!     u8       kind
//!     u64      start_time_unix_nano
//!     u64      end_time_unix_nano
//!     u16      name_len
//!     [u8]     name
//! }
//! ```
//!
//! The span count sits in the header so a receiver can measure a buffer
//! without walking it.

use crate::error::CodecError;
use crate::model::{Span, SpanId, SpanKind, TraceId};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

const HEADER_LEN: usize = 4;
const FIXED_SPAN_LEN: usize = 16 + 8 + 1 + 8 + 8 + 2;

/// Span fields carried by the compact layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactSpan {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub kind: SpanKind,
    pub start_time_unix_nano: u64,
    pub end_time_unix_nano: u64,
    pub name: String,
}

impl From<&Span> for CompactSpan {
    fn from(span: &Span) -> Self {
        Self {
            trace_id: span.trace_id,
            span_id: span.span_id,
            kind: span.kind,
            start_time_unix_nano: span.start_time_unix_nano,
            end_time_unix_nano: span.end_time_unix_nano,
            name: span.name.clone(),
        }
    }
}

/// An encoded span batch in the compact layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSpanBuffer {
    bytes: Bytes,
}

impl EncodedSpanBuffer {
    /// Encodes the given spans.
    pub fn encode<'a, I>(spans: I) -> Self
    where
        I: IntoIterator<Item = &'a CompactSpan>,
        I::IntoIter: ExactSizeIterator,
    {
        let spans = spans.into_iter();
        let mut buf = BytesMut::with_capacity(HEADER_LEN + spans.len() * (FIXED_SPAN_LEN + 32));
        buf.put_u32_le(spans.len() as u32);
        for span in spans {
            let name = truncate_name(&span.name).as_bytes();
            buf.put_slice(&span.trace_id.0);
            buf.put_slice(&span.span_id.0);
            buf.put_u8(span.kind.as_u8());
            buf.put_u64_le(span.start_time_unix_nano);
            buf.put_u64_le(span.end_time_unix_nano);
            buf.put_u16_le(name.len() as u16);
            buf.put_slice(name);
        }
        Self { bytes: buf.freeze() }
    }

    /// Wraps raw bytes received from the wire.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reads the span count from the header without decoding the spans.
    pub fn span_count(&self) -> Result<usize, CodecError> {
        let mut header = &self.bytes[..];
        ensure(header.len(), 0, HEADER_LEN)?;
        Ok(header.get_u32_le() as usize)
    }

    /// Decodes every span in the buffer.
    pub fn decode(&self) -> Result<Vec<CompactSpan>, CodecError> {
        let total = self.bytes.len();
        let mut cursor = &self.bytes[..];
        ensure(cursor.len(), 0, HEADER_LEN)?;
        let count = cursor.get_u32_le() as usize;

        let mut spans = Vec::with_capacity(count.min(cursor.len() / FIXED_SPAN_LEN));
        for _ in 0..count {
            ensure(cursor.len(), total - cursor.len(), FIXED_SPAN_LEN)?;
            let mut trace_id = [0u8; 16];
            cursor.copy_to_slice(&mut trace_id);
            let mut span_id = [0u8; 8];
            cursor.copy_to_slice(&mut span_id);
            let tag = cursor.get_u8();
            let kind = SpanKind::from_u8(tag).ok_or(CodecError::InvalidSpanKind(tag))?;
            let start_time_unix_nano = cursor.get_u64_le();
            let end_time_unix_nano = cursor.get_u64_le();
            let name_len = cursor.get_u16_le() as usize;

            ensure(cursor.len(), total - cursor.len(), name_len)?;
            let name = String::from_utf8(cursor[..name_len].to_vec())?;
            cursor.advance(name_len);

            spans.push(CompactSpan {
                trace_id: TraceId(trace_id),
                span_id: SpanId(span_id),
                kind,
                start_time_unix_nano,
                end_time_unix_nano,
                name,
            });
        }
        Ok(spans)
    }
}

/// Cuts `name` to at most `u16::MAX` bytes on a char boundary.
fn truncate_name(name: &str) -> &str {
    let mut end = name.len().min(u16::MAX as usize);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn ensure(remaining: usize, offset: usize, needed: usize) -> Result<(), CodecError> {
    if remaining < needed {
        return Err(CodecError::Truncated {
            offset,
            needed: needed - remaining,
        });
    }
    Ok(())
}

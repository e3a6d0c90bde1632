//! Export request envelope and acknowledgement.

use crate::compact::EncodedSpanBuffer;
use crate::error::CodecError;
use crate::model::{MetricBatch, TraceBatch};
use serde::{Deserialize, Serialize};

/// Request identifier reserved as invalid; senders never assign it.
pub const RESERVED_REQUEST_ID: u64 = 0;

/// Uniform access to what a transport needs from a request: the correlation
/// identifier and the number of items it carries.
pub trait Export {
    /// Sender-assigned correlation identifier.
    fn request_id(&self) -> u64;

    /// Number of spans or metrics carried, measured without a full decode.
    fn item_count(&self) -> Result<usize, CodecError>;
}

/// Payload of an export request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportBody {
    Traces(TraceBatch),
    Metrics(MetricBatch),
    EncodedSpans(EncodedSpanBuffer),
}

impl ExportBody {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportBody::Traces(_) => "traces",
            ExportBody::Metrics(_) => "metrics",
            ExportBody::EncodedSpans(_) => "encoded_spans",
        }
    }

    pub fn item_count(&self) -> Result<usize, CodecError> {
        match self {
            ExportBody::Traces(batch) => Ok(batch.spans.len()),
            ExportBody::Metrics(batch) => Ok(batch.metrics.len()),
            ExportBody::EncodedSpans(buffer) => buffer.span_count(),
        }
    }
}

impl From<TraceBatch> for ExportBody {
    fn from(batch: TraceBatch) -> Self {
        ExportBody::Traces(batch)
    }
}

impl From<MetricBatch> for ExportBody {
    fn from(batch: MetricBatch) -> Self {
        ExportBody::Metrics(batch)
    }
}

impl From<EncodedSpanBuffer> for ExportBody {
    fn from(buffer: EncodedSpanBuffer) -> Self {
        ExportBody::EncodedSpans(buffer)
    }
}

/// A batch tagged with its request identifier.
///
/// The identifier is the first field so that binary encodings carry it in
/// the leading bytes of every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub id: u64,
    pub body: ExportBody,
}

impl ExportRequest {
    pub fn new(id: u64, body: impl Into<ExportBody>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }
}

impl Export for ExportRequest {
    fn request_id(&self) -> u64 {
        self.id
    }

    fn item_count(&self) -> Result<usize, CodecError> {
        self.body.item_count()
    }
}

/// Acknowledgement echoing a processed request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAck {
    pub id: u64,
}

impl ExportAck {
    /// Acknowledgement for the given request.
    pub fn for_request(request: &impl Export) -> Self {
        Self {
            id: request.request_id(),
        }
    }
}

/// Sender-side source of request identifiers: 1, 2, 3, ...
#[derive(Debug, Default)]
pub struct RequestIdSequence {
    last: u64,
}

impl RequestIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier, never [`RESERVED_REQUEST_ID`].
    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        debug_assert_ne!(self.last, RESERVED_REQUEST_ID);
        self.last
    }

    /// Last identifier handed out, or 0 if none yet.
    pub fn last(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{Generator, GeneratorConfig, MetricShapes};

    #[test]
    fn test_request_ids_start_at_one() {
        let mut ids = RequestIdSequence::new();
        assert_eq!(ids.last(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.last(), 2);
    }

    #[test]
    fn test_item_count_per_body() {
        let mut generator = Generator::new(GeneratorConfig::default());

        let traces = ExportRequest::new(1, generator.generate_span_batch(10, Some(4), 2));
        assert_eq!(traces.item_count().unwrap(), 10);
        assert_eq!(traces.body.kind(), "traces");

        let metrics = ExportRequest::new(2, generator.generate_metric_batch(2, 3, MetricShapes::ALL));
        assert_eq!(metrics.item_count().unwrap(), 6);

        let encoded = ExportRequest::new(3, generator.generate_encoded_span_batch(5));
        assert_eq!(encoded.item_count().unwrap(), 5);
        assert_eq!(ExportAck::for_request(&encoded), ExportAck { id: 3 });
    }
}

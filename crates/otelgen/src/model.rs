//! Telemetry data model carried by export requests.
//!
//! The shapes follow the OpenTelemetry protocol closely enough to exercise the
//! same encoding costs: one [`Resource`] per batch, spans with typed attributes
//! and timed events, and metrics with int64 gauge, histogram, and summary
//! timeseries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 16-byte trace identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraceId(pub [u8; 16]);

impl TraceId {
    /// Builds the identifier for the given trace sequence number.
    ///
    /// The sequence is stored big-endian in the trailing bytes, so byte order
    /// and numeric order agree.
    pub fn from_sequence(seq: u64) -> Self {
        Self(u128::from(seq).to_be_bytes())
    }

    /// Recovers the sequence number this identifier was built from.
    pub fn sequence(&self) -> u64 {
        u128::from_be_bytes(self.0) as u64
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

/// 8-byte span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanId(pub [u8; 8]);

impl SpanId {
    /// Builds the identifier for the given span sequence number.
    pub fn from_sequence(seq: u64) -> Self {
        Self(seq.to_be_bytes())
    }

    /// Recovers the sequence number this identifier was built from.
    pub fn sequence(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", u64::from_be_bytes(self.0))
    }
}

/// Attribute value types for span, event, and resource metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    String(String),
    Int64(i64),
    Double(f64),
    Bool(bool),
}

/// A single typed key/value attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AttributeValue,
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AttributeValue::String(value.into()),
        }
    }

    pub fn int64(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: AttributeValue::Int64(value),
        }
    }
}

/// Static attributes identifying the producing process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

/// Span kind according to OpenTelemetry specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Unspecified,
    /// Internal operation span
    Internal,
    /// Server-side RPC span
    Server,
    /// Client-side RPC span
    Client,
    /// Producer span (messaging)
    Producer,
    /// Consumer span (messaging)
    Consumer,
}

impl SpanKind {
    /// Stable single-byte tag used by the compact span buffer.
    pub fn as_u8(self) -> u8 {
        match self {
            SpanKind::Unspecified => 0,
            SpanKind::Internal => 1,
            SpanKind::Server => 2,
            SpanKind::Client => 3,
            SpanKind::Producer => 4,
            SpanKind::Consumer => 5,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => SpanKind::Unspecified,
            1 => SpanKind::Internal,
            2 => SpanKind::Server,
            3 => SpanKind::Client,
            4 => SpanKind::Producer,
            5 => SpanKind::Consumer,
            _ => return None,
        })
    }
}

/// A timestamped event within a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub time_unix_nano: u64,
    pub attributes: Vec<KeyValue>,
}

/// Represents a single distributed tracing span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    /// `None` for root spans
    pub parent_span_id: Option<SpanId>,
    /// Operation name
    pub name: String,
    pub kind: SpanKind,
    /// Span start time (Unix nanoseconds)
    pub start_time_unix_nano: u64,
    /// Span end time (Unix nanoseconds), never before the start
    pub end_time_unix_nano: u64,
    /// `None` means no attribute collection was attached at all, which is
    /// distinct from an attached but empty one.
    pub attributes: Option<Vec<KeyValue>>,
    pub timed_events: Vec<TimedEvent>,
}

impl Span {
    /// Duration of the span in nanoseconds
    pub fn duration_nanos(&self) -> u64 {
        self.end_time_unix_nano.saturating_sub(self.start_time_unix_nano)
    }
}

/// One resource plus the spans it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceBatch {
    pub resource: Resource,
    pub spans: Vec<Span>,
}

impl TraceBatch {
    /// Returns the number of spans in the batch
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns true if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Numeric kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    GaugeInt64,
    Histogram,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub description: String,
    pub kind: MetricKind,
    pub label_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Int64Point {
    /// Only set on the first point of a timeseries
    pub start_time_unix_nano: Option<u64>,
    pub time_unix_nano: u64,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Int64TimeSeries {
    pub label_values: Vec<String>,
    pub points: Vec<Int64Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub value: f64,
    pub time_unix_nano: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub count: u64,
    pub exemplar: Option<Exemplar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub start_time_unix_nano: Option<u64>,
    pub time_unix_nano: u64,
    pub count: u64,
    pub sum: f64,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramTimeSeries {
    pub label_values: Vec<String>,
    pub explicit_bounds: Vec<f64>,
    pub points: Vec<HistogramPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAtPercentile {
    pub percentile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPoint {
    pub start_time_unix_nano: Option<u64>,
    pub time_unix_nano: u64,
    pub count: u64,
    pub sum: f64,
    pub percentile_values: Vec<ValueAtPercentile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTimeSeries {
    pub label_values: Vec<String>,
    pub points: Vec<SummaryPoint>,
}

/// Timeseries of a metric, one variant per numeric kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricData {
    Int64(Vec<Int64TimeSeries>),
    Histogram(Vec<HistogramTimeSeries>),
    Summary(Vec<SummaryTimeSeries>),
}

impl MetricData {
    /// Number of timeseries regardless of kind.
    pub fn timeseries_count(&self) -> usize {
        match self {
            MetricData::Int64(ts) => ts.len(),
            MetricData::Histogram(ts) => ts.len(),
            MetricData::Summary(ts) => ts.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub descriptor: MetricDescriptor,
    pub data: MetricData,
}

/// One resource plus the metrics it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBatch {
    pub resource: Resource,
    pub metrics: Vec<Metric>,
}

impl MetricBatch {
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_preserve_numeric_order() {
        assert!(TraceId::from_sequence(1) < TraceId::from_sequence(2));
        assert!(TraceId::from_sequence(255) < TraceId::from_sequence(256));
        assert!(SpanId::from_sequence(255) < SpanId::from_sequence(256));
        assert_eq!(SpanId::from_sequence(4242).sequence(), 4242);
        assert_eq!(TraceId::from_sequence(u64::MAX).sequence(), u64::MAX);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(SpanId::from_sequence(0xab).to_string(), "00000000000000ab");
        assert_eq!(
            TraceId::from_sequence(1).to_string(),
            "00000000000000000000000000000001"
        );
    }

    #[test]
    fn test_span_kind_tags() {
        for kind in [
            SpanKind::Unspecified,
            SpanKind::Internal,
            SpanKind::Server,
            SpanKind::Client,
            SpanKind::Producer,
            SpanKind::Consumer,
        ] {
            assert_eq!(SpanKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(SpanKind::from_u8(6), None);
    }
}

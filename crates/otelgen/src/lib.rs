//! Deterministic Telemetry Batch Generator
//!
//! Synthesizes reproducible trace and metric batches for driving telemetry
//! export transports under load, and the envelope and encodings those
//! transports put on the wire.
//!
//! # Features
//!
//! - **Reproducible content**: attribute keys and values come from a seeded
//!   random source; timestamps are fixed offsets from a reference instant
//! - **Monotonic identifiers**: trace and span ids come from shared atomic
//!   counters, strictly increasing across concurrent generators
//! - **Uniform envelope**: [`ExportRequest`] carries traces, metrics, or a
//!   compact span buffer behind one [`Export`] interface
//! - **Interchangeable encodings**: [`Encoding::Binary`] and [`Encoding::Json`]
//!
//! # Example
//!
//! ```rust
//! use otelgen::{Encoding, ExportRequest, Generator, GeneratorConfig};
//!
//! let mut generator = Generator::new(GeneratorConfig::default());
//! let batch = generator.generate_span_batch(10, Some(4), 2);
//! let request = ExportRequest::new(1, batch);
//!
//! let bytes = Encoding::Binary.encode_request(&request).unwrap();
//! let decoded = Encoding::Binary.decode_request(&bytes).unwrap();
//! assert_eq!(decoded, request);
//! ```

pub mod compact;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod model;
pub mod request;

pub use compact::{CompactSpan, EncodedSpanBuffer};
pub use encoding::Encoding;
pub use error::CodecError;
pub use generator::{
    Generator, GeneratorConfig, IdSequence, MetricShapes, DEFAULT_SEED, REFERENCE_TIME_UNIX_NANO,
    SPAN_SEQ_ATTR, TRACE_SEQ_ATTR,
};
pub use model::{
    AttributeValue, KeyValue, Metric, MetricBatch, MetricData, MetricKind, Resource, Span, SpanId,
    SpanKind, TraceBatch, TraceId,
};
pub use request::{Export, ExportAck, ExportBody, ExportRequest, RequestIdSequence, RESERVED_REQUEST_ID};

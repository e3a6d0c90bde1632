//! Deterministic Batch Generator
//!
//! Produces trace and metric batches whose content is reproducible for a given
//! seed and whose identifiers are strictly increasing for the lifetime of an
//! [`IdSequence`].
//!
//! # Two sources of variation
//!
//! | Source | Drives | Shared across generators |
//! |--------|--------|--------------------------|
//! | [`IdSequence`] (atomics) | trace/span identifiers, seq-num attributes | yes, via `Arc` |
//! | seeded `ChaCha20Rng` | random attribute keys and values | no, one per generator |
//!
//! Structure (span count, attribute count, event count) depends only on the
//! call parameters, never on the random stream. Timestamps are pinned to
//! [`GeneratorConfig::reference_time_unix_nano`] plus fixed offsets, so no
//! wall-clock time leaks into a payload.
//!
//! # Concurrent generation
//!
//! A [`Generator`] owns its random source and needs `&mut self`. Concurrent
//! producers each take a [`Generator::fork`] that shares the parent's
//! `IdSequence`, so identifiers stay globally unique:
//!
//! ```rust
//! use otelgen::{Generator, GeneratorConfig};
//!
//! let mut parent = Generator::new(GeneratorConfig::default());
//! let mut child = parent.fork(7);
//!
//! let a = parent.generate_span_batch(2, Some(2), 0);
//! let b = child.generate_span_batch(2, Some(2), 0);
//! assert!(b.spans[0].span_id > a.spans[1].span_id);
//! ```

use crate::compact::{CompactSpan, EncodedSpanBuffer};
use crate::model::{
    Bucket, Exemplar, HistogramPoint, HistogramTimeSeries, Int64Point, Int64TimeSeries, KeyValue,
    Metric, MetricBatch, MetricData, MetricDescriptor, MetricKind, Resource, Span, SpanId,
    SpanKind, SummaryPoint, SummaryTimeSeries, TimedEvent, TraceBatch, TraceId,
    ValueAtPercentile,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 99;

/// 2019-10-31T10:11:12.000000013Z
pub const REFERENCE_TIME_UNIX_NANO: u64 = 1_572_516_672_000_000_013;

/// Attribute carrying the span sequence number.
pub const SPAN_SEQ_ATTR: &str = "load_generator.span_seq_num";
/// Attribute carrying the trace sequence number.
pub const TRACE_SEQ_ATTR: &str = "load_generator.trace_seq_num";
/// Attribute attached to every timed event, carrying the owning span's sequence number.
pub const EVENT_SPAN_ATTR: &str = "te";

const SPAN_NAME: &str = "load-generator-span";
const NANOS_PER_MILLI: u64 = 1_000_000;
const GAUGE_TIMESERIES: usize = 5;
const HISTOGRAM_BOUNDS: [f64; 2] = [0.0, 1_000_000.0];

/// Configuration for batch generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random attribute content.
    ///
    /// Default: 99
    pub seed: u64,

    /// Fixed instant every generated timestamp is offset from.
    ///
    /// Default: [`REFERENCE_TIME_UNIX_NANO`]
    pub reference_time_unix_nano: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            reference_time_unix_nano: REFERENCE_TIME_UNIX_NANO,
        }
    }
}

impl GeneratorConfig {
    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the reference instant.
    pub fn with_reference_time(mut self, unix_nano: u64) -> Self {
        self.reference_time_unix_nano = unix_nano;
        self
    }
}

/// Which metric shapes to emit for every metric index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricShapes {
    pub int64: bool,
    pub histogram: bool,
    pub summary: bool,
}

impl MetricShapes {
    /// All three shapes.
    pub const ALL: Self = Self {
        int64: true,
        histogram: true,
        summary: true,
    };

    /// Number of metrics emitted per metric index.
    pub fn per_index(self) -> usize {
        usize::from(self.int64) + usize::from(self.histogram) + usize::from(self.summary)
    }
}

/// Trace and span counters shared by every generator that draws identifiers
/// from the same sequence.
///
/// Counters start at zero; the first identifier handed out is 1.
#[derive(Debug, Default)]
pub struct IdSequence {
    traces_sent: AtomicU64,
    spans_sent: AtomicU64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the trace counter and returns the new value.
    pub fn next_trace(&self) -> u64 {
        self.traces_sent.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Advances the span counter and returns the new value.
    pub fn next_span(&self) -> u64 {
        self.spans_sent.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn traces_sent(&self) -> u64 {
        self.traces_sent.load(Ordering::Relaxed)
    }

    pub fn spans_sent(&self) -> u64 {
        self.spans_sent.load(Ordering::Relaxed)
    }
}

/// Generates trace and metric batches.
pub struct Generator {
    config: GeneratorConfig,
    ids: Arc<IdSequence>,
    rng: ChaCha20Rng,
}

impl Generator {
    /// Creates a generator with its own identifier sequence.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_ids(config, Arc::new(IdSequence::new()))
    }

    /// Creates a generator drawing identifiers from an existing sequence.
    pub fn with_ids(config: GeneratorConfig, ids: Arc<IdSequence>) -> Self {
        // Fixed algorithm: content for a seed must not change across rand releases.
        let rng = ChaCha20Rng::seed_from_u64(config.seed);
        Self { config, ids, rng }
    }

    /// Creates a generator sharing this one's identifier sequence but with
    /// its own random source seeded by `seed`.
    pub fn fork(&self, seed: u64) -> Self {
        Self::with_ids(self.config.clone().with_seed(seed), Arc::clone(&self.ids))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the shared identifier sequence.
    pub fn ids(&self) -> &Arc<IdSequence> {
        &self.ids
    }

    /// Generates one trace batch.
    ///
    /// - `attrs_per_span = None` attaches no attribute collection at all.
    /// - `Some(n)` with `n >= 2` starts with the span and trace sequence
    ///   attributes and fills the remaining slots with random strings.
    /// - `Some(0)` and `Some(1)` attach random attributes only.
    ///
    /// Every span's end time is its start plus its index in milliseconds, and
    /// timed event `i` is stamped at start plus `i` milliseconds.
    pub fn generate_span_batch(
        &mut self,
        spans_per_batch: usize,
        attrs_per_span: Option<usize>,
        timed_events_per_span: usize,
    ) -> TraceBatch {
        let trace_seq = self.ids.next_trace();
        let start = self.config.reference_time_unix_nano;

        let mut spans = Vec::with_capacity(spans_per_batch);
        for i in 0..spans_per_batch {
            let span_seq = self.ids.next_span();

            let attributes = attrs_per_span.map(|count| self.span_attributes(count, span_seq, trace_seq));

            let timed_events = (0..timed_events_per_span)
                .map(|e| TimedEvent {
                    time_unix_nano: start + e as u64 * NANOS_PER_MILLI,
                    attributes: vec![KeyValue::int64(EVENT_SPAN_ATTR, span_seq as i64)],
                })
                .collect();

            let span = Span {
                trace_id: TraceId::from_sequence(trace_seq),
                span_id: SpanId::from_sequence(span_seq),
                parent_span_id: None,
                name: SPAN_NAME.to_string(),
                kind: SpanKind::Client,
                start_time_unix_nano: start,
                end_time_unix_nano: start + i as u64 * NANOS_PER_MILLI,
                attributes,
                timed_events,
            };
            debug_assert!(span.end_time_unix_nano >= span.start_time_unix_nano);
            spans.push(span);
        }

        TraceBatch {
            resource: generator_resource(),
            spans,
        }
    }

    /// Generates a span batch in the compact fixed layout.
    ///
    /// Identifiers come from the same sequence as [`generate_span_batch`],
    /// each span lasting one millisecond.
    ///
    /// [`generate_span_batch`]: Generator::generate_span_batch
    pub fn generate_encoded_span_batch(&mut self, spans_per_batch: usize) -> EncodedSpanBuffer {
        let trace_id = TraceId::from_sequence(self.ids.next_trace());
        let start = self.config.reference_time_unix_nano;

        let spans: Vec<CompactSpan> = (0..spans_per_batch)
            .map(|_| CompactSpan {
                trace_id,
                span_id: SpanId::from_sequence(self.ids.next_span()),
                kind: SpanKind::Client,
                start_time_unix_nano: start,
                end_time_unix_nano: start + NANOS_PER_MILLI,
                name: SPAN_NAME.to_string(),
            })
            .collect();

        EncodedSpanBuffer::encode(&spans)
    }

    /// Generates one metric batch.
    ///
    /// For each of `metrics_per_batch` indices, emits the enabled shapes in
    /// the order int64 gauge, histogram, summary.
    pub fn generate_metric_batch(
        &self,
        metrics_per_batch: usize,
        values_per_timeseries: usize,
        shapes: MetricShapes,
    ) -> MetricBatch {
        let start = self.config.reference_time_unix_nano;
        let mut metrics = Vec::with_capacity(metrics_per_batch * shapes.per_index());

        for index in 0..metrics_per_batch {
            if shapes.int64 {
                metrics.push(int64_gauge(start, index, values_per_timeseries));
            }
            if shapes.histogram {
                metrics.push(histogram(start, index, values_per_timeseries));
            }
            if shapes.summary {
                metrics.push(summary(start, index, values_per_timeseries));
            }
        }

        MetricBatch {
            resource: generator_resource(),
            metrics,
        }
    }

    fn span_attributes(&mut self, count: usize, span_seq: u64, trace_seq: u64) -> Vec<KeyValue> {
        let mut attributes = Vec::with_capacity(count);
        if count >= 2 {
            attributes.push(KeyValue::int64(SPAN_SEQ_ATTR, span_seq as i64));
            attributes.push(KeyValue::int64(TRACE_SEQ_ATTR, trace_seq as i64));
        }
        while attributes.len() < count {
            let key_len = self.rng.gen_range(1..=50);
            let key = self.random_ascii(key_len);
            let value_len = self.rng.gen_range(1..=20);
            let value = self.random_ascii(value_len);
            attributes.push(KeyValue::string(key, value));
        }
        attributes
    }

    /// Printable ASCII drawn from `'!'..='*'`.
    fn random_ascii(&mut self, len: usize) -> String {
        (0..len).map(|_| char::from(self.rng.gen_range(33u8..43))).collect()
    }
}

fn generator_resource() -> Resource {
    Resource {
        attributes: vec![
            KeyValue::int64("StartTimeUnixnano", 12_345_678),
            KeyValue::int64("Pid", 1234),
            KeyValue::string("HostName", "fakehost"),
            KeyValue::string("ServiceName", "generator"),
        ],
    }
}

fn descriptor(index: usize, kind: MetricKind) -> MetricDescriptor {
    MetricDescriptor {
        name: format!("metric{}", index),
        description: format!("some description: {}", index),
        kind,
        label_keys: vec!["label1".to_string(), "label2".to_string()],
    }
}

fn label_values() -> Vec<String> {
    vec!["val1".to_string(), "val2".to_string()]
}

/// Point timestamp for timeseries `ts` and point `point`.
fn point_time(start: u64, ts: usize, point: usize) -> u64 {
    start + (ts * point) as u64 * NANOS_PER_MILLI
}

/// Start timestamp, set only on a series' first point.
fn first_point_start(point: usize, time: u64) -> Option<u64> {
    (point == 0).then_some(time)
}

fn int64_gauge(start: u64, index: usize, values_per_timeseries: usize) -> Metric {
    let timeseries = (0..GAUGE_TIMESERIES)
        .map(|ts| Int64TimeSeries {
            label_values: label_values(),
            points: (0..values_per_timeseries)
                .map(|point| {
                    let time = point_time(start, ts, point);
                    Int64Point {
                        start_time_unix_nano: first_point_start(point, time),
                        time_unix_nano: time,
                        value: (index * ts * point) as i64,
                    }
                })
                .collect(),
        })
        .collect();

    Metric {
        descriptor: descriptor(index, MetricKind::GaugeInt64),
        data: MetricData::Int64(timeseries),
    }
}

fn histogram(start: u64, index: usize, values_per_timeseries: usize) -> Metric {
    // Single timeseries, so the series index is always zero
    let ts = 0;
    let points = (0..values_per_timeseries)
        .map(|point| {
            let time = point_time(start, ts, point);
            let value = (index * ts * point) as f64;
            HistogramPoint {
                start_time_unix_nano: first_point_start(point, time),
                time_unix_nano: time,
                count: 1,
                sum: value,
                buckets: vec![
                    Bucket {
                        count: 12,
                        exemplar: Some(Exemplar {
                            value,
                            time_unix_nano: time,
                        }),
                    },
                    Bucket {
                        count: 345,
                        exemplar: None,
                    },
                ],
            }
        })
        .collect();

    Metric {
        descriptor: descriptor(index, MetricKind::Histogram),
        data: MetricData::Histogram(vec![HistogramTimeSeries {
            label_values: label_values(),
            explicit_bounds: HISTOGRAM_BOUNDS.to_vec(),
            points,
        }]),
    }
}

fn summary(start: u64, index: usize, values_per_timeseries: usize) -> Metric {
    let ts = 0;
    let points = (0..values_per_timeseries)
        .map(|point| {
            let time = point_time(start, ts, point);
            let value = (index * ts * point) as f64;
            SummaryPoint {
                start_time_unix_nano: first_point_start(point, time),
                time_unix_nano: time,
                count: 1,
                sum: value,
                percentile_values: vec![ValueAtPercentile {
                    percentile: 99.0,
                    value: value / 10.0,
                }],
            }
        })
        .collect();

    Metric {
        descriptor: descriptor(index, MetricKind::Summary),
        data: MetricData::Summary(vec![SummaryTimeSeries {
            label_values: label_values(),
            points,
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeValue;

    fn int_attr(kv: &KeyValue) -> i64 {
        match kv.value {
            AttributeValue::Int64(v) => v,
            ref other => panic!("expected int64 attribute, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_content_follows_chacha20_stream() {
        let mut generator = Generator::new(GeneratorConfig::default().with_seed(7));
        let batch = generator.generate_span_batch(1, Some(3), 0);
        let attrs = batch.spans[0].attributes.as_ref().unwrap();

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let ascii = |rng: &mut ChaCha20Rng, len: usize| -> String {
            (0..len).map(|_| char::from(rng.gen_range(33u8..43))).collect()
        };
        let key_len = rng.gen_range(1..=50usize);
        let key = ascii(&mut rng, key_len);
        let value_len = rng.gen_range(1..=20usize);
        let value = ascii(&mut rng, value_len);

        assert_eq!(attrs[2], KeyValue::string(key, value));
    }

    #[test]
    fn test_span_batch_shape() {
        let mut generator = Generator::new(GeneratorConfig::default());
        let batch = generator.generate_span_batch(10, Some(4), 2);

        assert_eq!(batch.len(), 10);
        assert_eq!(batch.resource.attributes.len(), 4);
        for (i, span) in batch.spans.iter().enumerate() {
            let attrs = span.attributes.as_ref().unwrap();
            assert_eq!(attrs.len(), 4);
            assert_eq!(attrs[0].key, SPAN_SEQ_ATTR);
            assert_eq!(int_attr(&attrs[0]), span.span_id.sequence() as i64);
            assert_eq!(attrs[1].key, TRACE_SEQ_ATTR);
            assert_eq!(int_attr(&attrs[1]), 1);
            assert_eq!(span.timed_events.len(), 2);
            assert_eq!(span.duration_nanos(), i as u64 * NANOS_PER_MILLI);
        }
    }

    #[test]
    fn test_negative_attribute_count_attaches_nothing() {
        let mut generator = Generator::new(GeneratorConfig::default());
        let none = generator.generate_span_batch(3, None, 0);
        assert!(none.spans.iter().all(|s| s.attributes.is_none()));

        let empty = generator.generate_span_batch(3, Some(0), 0);
        assert!(empty.spans.iter().all(|s| s.attributes.as_deref() == Some(&[][..])));
    }

    #[test]
    fn test_small_attribute_counts_are_random_only() {
        let mut generator = Generator::new(GeneratorConfig::default());
        let batch = generator.generate_span_batch(1, Some(1), 0);
        let attrs = batch.spans[0].attributes.as_ref().unwrap();
        assert_eq!(attrs.len(), 1);
        assert_ne!(attrs[0].key, SPAN_SEQ_ATTR);
    }

    #[test]
    fn test_random_attribute_content_bounds() {
        let mut generator = Generator::new(GeneratorConfig::default());
        let batch = generator.generate_span_batch(50, Some(6), 0);
        for span in &batch.spans {
            for kv in &span.attributes.as_ref().unwrap()[2..] {
                assert!((1..=50).contains(&kv.key.len()));
                assert!(kv.key.bytes().all(|b| (33..=42).contains(&b)));
                match &kv.value {
                    AttributeValue::String(v) => {
                        assert!((1..=20).contains(&v.len()));
                        assert!(v.bytes().all(|b| (33..=42).contains(&b)));
                    }
                    other => panic!("expected string attribute, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_timed_events() {
        let mut generator = Generator::new(GeneratorConfig::default());
        let batch = generator.generate_span_batch(2, None, 3);
        let span = &batch.spans[1];
        for (i, event) in span.timed_events.iter().enumerate() {
            assert_eq!(
                event.time_unix_nano,
                REFERENCE_TIME_UNIX_NANO + i as u64 * NANOS_PER_MILLI
            );
            assert_eq!(event.attributes.len(), 1);
            assert_eq!(int_attr(&event.attributes[0]), span.span_id.sequence() as i64);
        }
    }

    #[test]
    fn test_seed_controls_content_not_structure() {
        let mut a = Generator::new(GeneratorConfig::default().with_seed(1));
        let mut b = Generator::new(GeneratorConfig::default().with_seed(2));
        let batch_a = a.generate_span_batch(5, Some(5), 1);
        let batch_b = b.generate_span_batch(5, Some(5), 1);

        let ids = |batch: &TraceBatch| -> Vec<_> {
            batch.spans.iter().map(|s| (s.trace_id, s.span_id)).collect()
        };
        assert_eq!(ids(&batch_a), ids(&batch_b));
        assert_ne!(batch_a, batch_b);
    }

    #[test]
    fn test_encoded_span_batch_shares_sequence() {
        let mut generator = Generator::new(GeneratorConfig::default());
        generator.generate_span_batch(3, None, 0);
        let buffer = generator.generate_encoded_span_batch(4);

        assert_eq!(buffer.span_count().unwrap(), 4);
        let spans = buffer.decode().unwrap();
        assert_eq!(spans[0].trace_id.sequence(), 2);
        assert_eq!(spans[0].span_id.sequence(), 4);
        assert_eq!(spans[3].span_id.sequence(), 7);
        assert_eq!(generator.ids().spans_sent(), 7);
    }

    #[test]
    fn test_metric_batch_all_shapes() {
        let generator = Generator::new(GeneratorConfig::default());
        let batch = generator.generate_metric_batch(3, 4, MetricShapes::ALL);
        assert_eq!(batch.len(), 9);

        let kinds: Vec<_> = batch.metrics.iter().map(|m| m.descriptor.kind).collect();
        assert_eq!(
            &kinds[..3],
            &[MetricKind::GaugeInt64, MetricKind::Histogram, MetricKind::Summary]
        );
        assert_eq!(batch.metrics[3].descriptor.name, "metric1");
    }

    #[test]
    fn test_int64_gauge_values() {
        let generator = Generator::new(GeneratorConfig::default());
        let shapes = MetricShapes {
            int64: true,
            histogram: false,
            summary: false,
        };
        let batch = generator.generate_metric_batch(3, 4, shapes);
        let MetricData::Int64(series) = &batch.metrics[2].data else {
            panic!("expected int64 gauge");
        };
        assert_eq!(series.len(), 5);
        for (ts, s) in series.iter().enumerate() {
            assert_eq!(s.points.len(), 4);
            for (point, p) in s.points.iter().enumerate() {
                assert_eq!(p.value, (2 * ts * point) as i64);
                assert_eq!(p.time_unix_nano, point_time(REFERENCE_TIME_UNIX_NANO, ts, point));
                if point == 0 {
                    assert_eq!(p.start_time_unix_nano, Some(p.time_unix_nano));
                } else {
                    assert_eq!(p.start_time_unix_nano, None);
                }
            }
        }
    }

    #[test]
    fn test_histogram_and_summary_layout() {
        let generator = Generator::new(GeneratorConfig::default());
        let shapes = MetricShapes {
            int64: false,
            histogram: true,
            summary: true,
        };
        let batch = generator.generate_metric_batch(1, 2, shapes);

        let MetricData::Histogram(hist) = &batch.metrics[0].data else {
            panic!("expected histogram");
        };
        assert_eq!(hist.len(), 1);
        assert_eq!(hist[0].explicit_bounds, vec![0.0, 1_000_000.0]);
        let buckets = &hist[0].points[0].buckets;
        assert_eq!(buckets[0].count, 12);
        assert!(buckets[0].exemplar.is_some());
        assert_eq!(buckets[1].count, 345);
        assert!(buckets[1].exemplar.is_none());

        let MetricData::Summary(summary) = &batch.metrics[1].data else {
            panic!("expected summary");
        };
        assert_eq!(summary[0].points.len(), 2);
        assert_eq!(summary[0].points[0].percentile_values[0].percentile, 99.0);
    }

    #[test]
    fn test_no_shapes_yields_empty_batch() {
        let generator = Generator::new(GeneratorConfig::default());
        let shapes = MetricShapes {
            int64: false,
            histogram: false,
            summary: false,
        };
        assert!(generator.generate_metric_batch(10, 10, shapes).is_empty());
    }
}

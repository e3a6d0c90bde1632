//! Property-based tests for the batch generator.
//!
//! Coverage:
//! - identifier monotonicity across successive batches
//! - attribute count and leading sequence attributes
//! - reproducibility for a fixed seed

use otelgen::{
    AttributeValue, Encoding, Generator, GeneratorConfig, MetricShapes, SPAN_SEQ_ATTR,
    TRACE_SEQ_ATTR,
};
use proptest::prelude::*;

// =============================================================================
// Monotonic identifiers
// "every emitted trace/span id is strictly greater than all earlier ones"
// =============================================================================

proptest! {
    #[test]
    fn prop_identifiers_strictly_increase(
        sizes in proptest::collection::vec(0usize..20, 1..30),
    ) {
        let mut generator = Generator::new(GeneratorConfig::default());
        let mut last_trace = None;
        let mut last_span = None;

        for spans in sizes {
            let batch = generator.generate_span_batch(spans, None, 0);
            for span in &batch.spans {
                if let Some(prev) = last_trace {
                    prop_assert!(span.trace_id >= prev, "trace id went backwards");
                }
                if let Some(prev) = last_span {
                    prop_assert!(span.span_id > prev, "span id {} not above {}", span.span_id, prev);
                }
                last_span = Some(span.span_id);
            }
            if let Some(span) = batch.spans.first() {
                if let Some(prev) = last_trace {
                    prop_assert!(span.trace_id > prev, "trace id {} not above {}", span.trace_id, prev);
                }
                last_trace = Some(span.trace_id);
            }
        }
    }

    #[test]
    fn prop_attribute_count_matches_request(
        spans in 1usize..10,
        attrs in 0usize..12,
        seed in any::<u64>(),
    ) {
        let mut generator = Generator::new(GeneratorConfig::default().with_seed(seed));
        let batch = generator.generate_span_batch(spans, Some(attrs), 0);

        for span in &batch.spans {
            let list = span.attributes.as_ref().expect("attributes attached");
            prop_assert_eq!(list.len(), attrs);
            if attrs >= 2 {
                prop_assert_eq!(&list[0].key, SPAN_SEQ_ATTR);
                prop_assert_eq!(&list[0].value, &AttributeValue::Int64(span.span_id.sequence() as i64));
                prop_assert_eq!(&list[1].key, TRACE_SEQ_ATTR);
                prop_assert_eq!(&list[1].value, &AttributeValue::Int64(span.trace_id.sequence() as i64));
            }
        }
    }

    #[test]
    fn prop_same_seed_same_bytes(
        seed in any::<u64>(),
        spans in 0usize..8,
        attrs in 0usize..8,
        events in 0usize..4,
    ) {
        let run = || {
            let mut generator = Generator::new(GeneratorConfig::default().with_seed(seed));
            let traces = generator.generate_span_batch(spans, Some(attrs), events);
            let metrics = generator.generate_metric_batch(spans, events, MetricShapes::ALL);
            (
                Encoding::Binary.encode(&traces).unwrap(),
                Encoding::Binary.encode(&metrics).unwrap(),
            )
        };
        prop_assert_eq!(run(), run());
    }
}

#[test]
fn test_negative_attribute_count_omits_collection() {
    let mut generator = Generator::new(GeneratorConfig::default());
    let batch = generator.generate_span_batch(4, None, 1);
    assert!(batch.spans.iter().all(|s| s.attributes.is_none()));

    // Absence survives both encodings
    for encoding in [Encoding::Binary, Encoding::Json] {
        let bytes = encoding.encode(&batch).unwrap();
        let decoded: otelgen::TraceBatch = encoding.decode(&bytes).unwrap();
        assert!(decoded.spans.iter().all(|s| s.attributes.is_none()));
    }
}

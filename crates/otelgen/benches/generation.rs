use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use otelgen::{Encoding, ExportRequest, Generator, GeneratorConfig, MetricShapes};

const SPANS_PER_BATCH: usize = 100;
const METRICS_PER_BATCH: usize = 10;

fn bench_span_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("span_batch");
    group.throughput(Throughput::Elements(SPANS_PER_BATCH as u64));

    for attrs in [0usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("generate", attrs), &attrs, |b, &attrs| {
            let mut generator = Generator::new(GeneratorConfig::default());
            b.iter(|| black_box(generator.generate_span_batch(SPANS_PER_BATCH, Some(attrs), 2)));
        });
    }

    group.bench_function("generate_compact", |b| {
        let mut generator = Generator::new(GeneratorConfig::default());
        b.iter(|| black_box(generator.generate_encoded_span_batch(SPANS_PER_BATCH)));
    });

    group.finish();
}

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_request");
    let mut generator = Generator::new(GeneratorConfig::default());
    let traces = ExportRequest::new(1, generator.generate_span_batch(SPANS_PER_BATCH, Some(4), 2));
    let metrics = ExportRequest::new(
        2,
        generator.generate_metric_batch(METRICS_PER_BATCH, 5, MetricShapes::ALL),
    );

    for encoding in [Encoding::Binary, Encoding::Json] {
        group.bench_with_input(BenchmarkId::new("traces", encoding), &traces, |b, request| {
            b.iter(|| black_box(encoding.encode_request(request).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("metrics", encoding), &metrics, |b, request| {
            b.iter(|| black_box(encoding.encode_request(request).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_span_batches, bench_encoding);
criterion_main!(benches);

//! Load generator harness: runs an export server or drives one with
//! generated batches.
//!
//! ```text
//! loadgen server --endpoint 127.0.0.1:4317 --transport stream
//! loadgen client --endpoint 127.0.0.1:4317 --batches 100 --spans-per-batch 500 --attrs-per-span 8 --connections 4
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use otelgen::{Encoding, ExportBody, ExportRequest, Generator, GeneratorConfig, MetricShapes, DEFAULT_SEED};
use otelgen_transport::{ClientConfig, Protocol, ServerConfig, StreamClient, TransportServer, UnaryClient};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loadgen", about = "Telemetry export load generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Accept export requests and count them.
    Server(ServerArgs),
    /// Generate batches and export them to a server.
    Client(ClientArgs),
}

#[derive(Args)]
struct TransportArgs {
    /// Address to listen on or connect to.
    #[arg(long, default_value = "127.0.0.1:4317")]
    endpoint: String,

    /// `stream` or `unary`.
    #[arg(long, default_value = "stream")]
    transport: Protocol,

    /// `binary` or `json`.
    #[arg(long, default_value = "binary")]
    encoding: Encoding,

    /// Per-frame read/write timeout in milliseconds.
    #[arg(long)]
    io_timeout_ms: Option<u64>,
}

#[derive(Args)]
struct ServerArgs {
    #[command(flatten)]
    transport: TransportArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum Signal {
    Traces,
    Metrics,
    Compact,
}

#[derive(Args)]
struct ClientArgs {
    #[command(flatten)]
    transport: TransportArgs,

    /// Number of requests to send.
    #[arg(long, default_value_t = 10)]
    batches: usize,

    /// What each request carries.
    #[arg(long, value_enum, default_value = "traces")]
    signal: Signal,

    #[arg(long, default_value_t = 100)]
    spans_per_batch: usize,

    /// Attributes per span; negative attaches no attribute collection.
    #[arg(long, default_value_t = 4, allow_hyphen_values = true)]
    attrs_per_span: i64,

    /// Timed events per span.
    #[arg(long, default_value_t = 0)]
    events: usize,

    #[arg(long, default_value_t = 10)]
    metrics_per_batch: usize,

    #[arg(long, default_value_t = 5)]
    values_per_timeseries: usize,

    #[arg(long)]
    no_int64: bool,

    #[arg(long)]
    no_histogram: bool,

    #[arg(long)]
    no_summary: bool,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Unacknowledged requests allowed in flight (stream only).
    #[arg(long, default_value_t = 1)]
    window: usize,

    /// Parallel connections, each sending `--batches` requests.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    connections: u64,
}

/// What one connection generates for each request.
#[derive(Clone, Copy)]
struct Workload {
    signal: Signal,
    spans_per_batch: usize,
    attrs_per_span: Option<usize>,
    events: usize,
    metrics_per_batch: usize,
    values_per_timeseries: usize,
    shapes: MetricShapes,
}

impl Workload {
    fn from_args(args: &ClientArgs) -> Self {
        Self {
            signal: args.signal,
            spans_per_batch: args.spans_per_batch,
            attrs_per_span: usize::try_from(args.attrs_per_span).ok(),
            events: args.events,
            metrics_per_batch: args.metrics_per_batch,
            values_per_timeseries: args.values_per_timeseries,
            shapes: MetricShapes {
                int64: !args.no_int64,
                histogram: !args.no_histogram,
                summary: !args.no_summary,
            },
        }
    }

    fn next_body(&self, generator: &mut Generator) -> ExportBody {
        match self.signal {
            Signal::Traces => generator
                .generate_span_batch(self.spans_per_batch, self.attrs_per_span, self.events)
                .into(),
            Signal::Metrics => generator
                .generate_metric_batch(self.metrics_per_batch, self.values_per_timeseries, self.shapes)
                .into(),
            Signal::Compact => generator.generate_encoded_span_batch(self.spans_per_batch).into(),
        }
    }
}

/// One generator per connection, all drawing ids from a single sequence.
///
/// Connection `i` is seeded with `seed + i`, so a single connection
/// reproduces a plain `--seed` run.
fn connection_generators(seed: u64, connections: u64) -> Vec<Generator> {
    let base = Generator::new(GeneratorConfig::default().with_seed(seed));
    (0..connections).map(|i| base.fork(seed.wrapping_add(i))).collect()
}

enum Exporter {
    Stream(StreamClient),
    Unary(UnaryClient),
}

impl Exporter {
    async fn export(&mut self, body: ExportBody) -> anyhow::Result<()> {
        match self {
            Exporter::Stream(client) => {
                client.export(body).await?;
            }
            Exporter::Unary(client) => {
                client.export(body).await?;
            }
        }
        Ok(())
    }

    async fn close(self) -> anyhow::Result<()> {
        match self {
            Exporter::Stream(client) => {
                client.close().await?;
            }
            Exporter::Unary(client) => client.close().await?,
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Server(args) => run_server(args).await,
        Command::Client(args) => run_client(args).await,
    }
}

async fn run_server(args: ServerArgs) -> anyhow::Result<()> {
    let TransportArgs {
        endpoint,
        transport,
        encoding,
        io_timeout_ms,
    } = args.transport;

    let mut config = ServerConfig::default().with_encoding(encoding);
    if let Some(ms) = io_timeout_ms {
        config = config.with_io_timeout(Duration::from_millis(ms));
    }

    let receiver = Arc::new(|_: &ExportRequest, _: usize| {});
    let server = TransportServer::bind(endpoint.as_str(), transport, config, receiver).await?;
    let metrics = Arc::clone(server.metrics());
    let shutdown = server.shutdown_signal();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    let started = Instant::now();
    server.serve().await?;
    info!(
        requests = metrics.requests_accepted(),
        items = metrics.items_received(),
        connections = metrics.connections_opened(),
        failed = metrics.connections_failed(),
        elapsed = ?started.elapsed(),
        "server summary"
    );
    Ok(())
}

async fn run_client(args: ClientArgs) -> anyhow::Result<()> {
    let mut config = ClientConfig::pipelined(args.window).with_encoding(args.transport.encoding);
    if let Some(ms) = args.transport.io_timeout_ms {
        config = config.with_io_timeout(Duration::from_millis(ms));
    }
    let workload = Workload::from_args(&args);

    let started = Instant::now();
    let mut connections = JoinSet::new();
    for (index, generator) in connection_generators(args.seed, args.connections)
        .into_iter()
        .enumerate()
    {
        let endpoint = args.transport.endpoint.clone();
        let protocol = args.transport.transport;
        let config = config.clone();
        let batches = args.batches;
        connections.spawn(async move {
            drive_connection(&endpoint, protocol, config, generator, workload, batches)
                .await
                .with_context(|| format!("connection {} failed", index + 1))
        });
    }

    let mut items = 0usize;
    while let Some(joined) = connections.join_next().await {
        items += joined??;
    }

    info!(
        connections = args.connections,
        batches = args.batches,
        items,
        elapsed = ?started.elapsed(),
        "client summary"
    );
    Ok(())
}

/// Sends `batches` requests over one connection; returns the items sent.
async fn drive_connection(
    endpoint: &str,
    protocol: Protocol,
    config: ClientConfig,
    mut generator: Generator,
    workload: Workload,
    batches: usize,
) -> anyhow::Result<usize> {
    let mut exporter = match protocol {
        Protocol::Streaming => Exporter::Stream(StreamClient::connect(endpoint, config).await?),
        Protocol::Unary => Exporter::Unary(UnaryClient::connect(endpoint, config).await?),
    };

    let mut items = 0usize;
    for batch in 0..batches {
        let body = workload.next_body(&mut generator);
        items += body.item_count()?;
        exporter
            .export(body)
            .await
            .with_context(|| format!("export of batch {} failed", batch + 1))?;
    }
    exporter.close().await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_connections() {
        let cli = Cli::try_parse_from(["loadgen", "client", "--connections", "3", "--attrs-per-span", "-1"]).unwrap();
        let Command::Client(args) = cli.command else {
            panic!("expected client subcommand");
        };
        assert_eq!(args.connections, 3);
        assert_eq!(Workload::from_args(&args).attrs_per_span, None);

        assert!(Cli::try_parse_from(["loadgen", "client", "--connections", "0"]).is_err());
    }

    #[test]
    fn test_connection_generators_share_ids() {
        let mut generators = connection_generators(DEFAULT_SEED, 3);
        assert_eq!(generators.len(), 3);
        assert_eq!(generators[0].config().seed, DEFAULT_SEED);
        assert_eq!(generators[2].config().seed, DEFAULT_SEED + 2);

        let mut last = None;
        for generator in &mut generators {
            let batch = generator.generate_span_batch(2, None, 0);
            for span in &batch.spans {
                assert!(last < Some(span.span_id));
                last = Some(span.span_id);
            }
        }
        assert_eq!(generators[0].ids().spans_sent(), 6);
    }
}

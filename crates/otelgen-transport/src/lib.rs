//! Export Transports for otelgen Batches
//!
//! This crate carries [`otelgen`] export requests over TCP with
//! length-delimited framing, in two flavours selected by [`Protocol`]:
//!
//! - **Streaming**: one persistent connection per client, requests numbered
//!   `1, 2, 3, ...` and acknowledged in order. The server rejects identifier
//!   0 and any gap, repeat or reversal by closing the connection.
//! - **Unary**: independent request/reply calls with no ordering across
//!   calls.
//!
//! Validated requests reach the application through a [`BatchReceiver`]
//! exactly once, before their acknowledgement is written.
//!
//! # Example
//!
//! ```ignore
//! use otelgen::{Generator, GeneratorConfig};
//! use otelgen_transport::{ClientConfig, Protocol, ServerConfig, StreamClient, TransportServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let receiver = Arc::new(|request: &otelgen::ExportRequest, items: usize| {
//!         println!("request {} carried {} items", request.id, items);
//!     });
//!     let server = TransportServer::bind("127.0.0.1:0", Protocol::Streaming, ServerConfig::default(), receiver)
//!         .await
//!         .unwrap();
//!     let addr = server.local_addr().unwrap();
//!     tokio::spawn(server.serve());
//!
//!     let mut generator = Generator::new(GeneratorConfig::default());
//!     let mut client = StreamClient::connect(addr, ClientConfig::strict()).await.unwrap();
//!     client.export(generator.generate_span_batch(10, Some(4), 2)).await.unwrap();
//!     client.close().await.unwrap();
//! }
//! ```

mod config;
mod error;
mod frame;
mod invariants;
mod metrics;
mod receiver;
mod server;
mod shutdown;
pub mod streaming;
pub mod unary;

pub use config::{ClientConfig, ServerConfig, DEFAULT_MAX_FRAME_LENGTH};
pub use error::{ProtocolViolation, TransportError};
pub use frame::FrameConnection;
pub use metrics::ServerMetrics;
pub use receiver::BatchReceiver;
pub use server::{Protocol, TransportServer};
pub use shutdown::ShutdownSignal;
pub use streaming::{ConnectionState, OrderingGuard, StreamClient};
pub use unary::{UnaryCall, UnaryClient, UnaryReply};

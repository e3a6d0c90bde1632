//! Listener and accept loop shared by both transports.
//!
//! The server owns the listening socket and spawns one task per connection
//! into a `JoinSet`. Connection tasks run the protocol loop of the selected
//! [`Protocol`]; the accept loop reaps them, logs how each one ended, and
//! records the outcome in [`ServerMetrics`].

use crate::config::ServerConfig;
use crate::error::TransportError;
use crate::frame::FrameConnection;
use crate::metrics::ServerMetrics;
use crate::receiver::BatchReceiver;
use crate::shutdown::ShutdownSignal;
use crate::{streaming, unary};
use otelgen::{Encoding, Export, ExportRequest};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

/// Which transport a server speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Persistent stream, strict ordering, one ack per request.
    #[default]
    Streaming,
    /// Independent calls, no ordering across calls.
    Unary,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Streaming => "stream",
            Protocol::Unary => "unary",
        })
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" | "streaming" => Ok(Protocol::Streaming),
            "unary" => Ok(Protocol::Unary),
            other => Err(format!("unknown transport '{}' (expected stream or unary)", other)),
        }
    }
}

/// Everything a connection task needs from its server.
#[derive(Clone)]
pub(crate) struct ConnectionContext {
    pub(crate) encoding: Encoding,
    pub(crate) receiver: Arc<dyn BatchReceiver>,
    pub(crate) metrics: Arc<ServerMetrics>,
    pub(crate) shutdown: ShutdownSignal,
}

impl ConnectionContext {
    /// Hands a validated request to the receiver and returns its item count.
    pub(crate) fn deliver(&self, request: &ExportRequest) -> Result<usize, TransportError> {
        let item_count = request.item_count()?;
        self.receiver.on_receive(request, item_count);
        self.metrics.record_request(item_count);
        Ok(item_count)
    }
}

type ConnectionOutcome = (SocketAddr, Result<u64, TransportError>);

/// A bound transport server.
pub struct TransportServer {
    listener: TcpListener,
    protocol: Protocol,
    config: ServerConfig,
    context: ConnectionContext,
}

impl TransportServer {
    /// Binds the listening socket.
    pub async fn bind<A>(
        endpoint: A,
        protocol: Protocol,
        config: ServerConfig,
        receiver: Arc<dyn BatchReceiver>,
    ) -> Result<Self, TransportError>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let label = endpoint.to_string();
        let listener = TcpListener::bind(endpoint)
            .await
            .map_err(|source| TransportError::Bind {
                endpoint: label,
                source,
            })?;

        let context = ConnectionContext {
            encoding: config.encoding,
            receiver,
            metrics: Arc::new(ServerMetrics::default()),
            shutdown: ShutdownSignal::new(),
        };

        Ok(Self {
            listener,
            protocol,
            config,
            context,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns a handle that stops [`serve`](Self::serve) when triggered.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.context.shutdown.clone()
    }

    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.context.metrics
    }

    /// Accepts connections until shutdown or an accept failure.
    ///
    /// On shutdown the listener is closed and connection tasks are aborted
    /// without draining.
    pub async fn serve(self) -> Result<(), TransportError> {
        let addr = self.local_addr()?;
        info!(%addr, protocol = %self.protocol, encoding = %self.config.encoding, "listening");

        let mut connections: JoinSet<ConnectionOutcome> = JoinSet::new();
        let result = loop {
            tokio::select! {
                biased;

                () = self.context.shutdown.wait() => break Ok(()),

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    self.reap(joined);
                }

                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!(%addr, error = %e, "accept failed");
                            break Err(TransportError::Accept(e));
                        }
                    };
                    self.context.metrics.record_connection();
                    info!(%peer, "connection opened");

                    let conn = FrameConnection::new(
                        stream,
                        peer,
                        self.config.max_frame_length,
                        self.config.io_timeout,
                    );
                    let context = self.context.clone();
                    match self.protocol {
                        Protocol::Streaming => connections.spawn(async move {
                            (peer, streaming::server::serve_connection(conn, context).await)
                        }),
                        Protocol::Unary => connections.spawn(async move {
                            (peer, unary::server::serve_connection(conn, context).await)
                        }),
                    };
                }
            }
        };

        drop(self.listener);
        connections.shutdown().await;
        info!(%addr, "server stopped");
        result
    }

    fn reap(&self, joined: Result<ConnectionOutcome, JoinError>) {
        match joined {
            Ok((peer, Ok(requests))) => {
                info!(%peer, requests, "connection closed");
            }
            Ok((peer, Err(e))) => {
                error!(%peer, error = %e, "connection terminated");
                self.context.metrics.record_failure(e.is_protocol_violation());
            }
            Err(e) => {
                error!(error = %e, "connection task panicked");
                self.context.metrics.record_failure(false);
            }
        }
    }
}

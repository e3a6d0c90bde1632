use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::frame::FrameConnection;
#[cfg(debug_assertions)]
use crate::invariants::debug_assert_window_respected;
use otelgen::{ExportBody, ExportRequest, RequestIdSequence};
use std::collections::VecDeque;
use std::fmt;
use tokio::net::ToSocketAddrs;
use tracing::{debug, error, info};

/// Sending half of an export stream.
///
/// Requests are numbered `1, 2, 3, ...` on this connection. With the default
/// window of 1 every [`export`](Self::export) returns only after the server
/// has acknowledged that request. Larger windows let up to `ack_window`
/// requests be outstanding; acknowledgements must still arrive in send order.
///
/// Any error leaves the client unusable: there is no retry or resync, and
/// every later call fails with [`TransportError::Closed`] without touching
/// the socket.
pub struct StreamClient {
    conn: FrameConnection,
    config: ClientConfig,
    ids: RequestIdSequence,
    in_flight: VecDeque<u64>,
    last_acked: u64,
    terminated: bool,
}

impl StreamClient {
    /// Opens a stream to `endpoint`.
    pub async fn connect<A>(endpoint: A, config: ClientConfig) -> Result<Self, TransportError>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let conn =
            FrameConnection::connect(endpoint, config.max_frame_length, config.io_timeout).await?;
        info!(
            peer = %conn.peer_addr(),
            window = config.ack_window.get(),
            encoding = %config.encoding,
            "stream opened"
        );
        Ok(Self {
            in_flight: VecDeque::with_capacity(config.ack_window.get()),
            conn,
            config,
            ids: RequestIdSequence::new(),
            last_acked: 0,
            terminated: false,
        })
    }

    /// Sends one batch and returns the identifier it was assigned.
    ///
    /// Blocks while the window is full, i.e. in strict mode until this
    /// request is acknowledged.
    pub async fn export(&mut self, body: impl Into<ExportBody>) -> Result<u64, TransportError> {
        self.ensure_open()?;
        let result = self.send_request(body.into()).await;
        self.terminate_on_error(result)
    }

    /// Waits for every outstanding acknowledgement.
    pub async fn flush(&mut self) -> Result<(), TransportError> {
        self.ensure_open()?;
        let result = self.drain_acks().await;
        self.terminate_on_error(result)
    }

    /// Flushes, then closes the stream.
    ///
    /// Returns the number of acknowledged requests.
    pub async fn close(mut self) -> Result<u64, TransportError> {
        self.flush().await?;
        self.conn.close().await?;
        info!(peer = %self.conn.peer_addr(), acked = self.last_acked, "stream closed");
        Ok(self.last_acked)
    }

    /// Returns `true` once an error has ended this stream.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Highest acknowledged identifier, 0 before the first ack.
    pub fn last_acked_id(&self) -> u64 {
        self.last_acked
    }

    /// Number of sent but unacknowledged requests.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.terminated {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn terminate_on_error<T>(&mut self, result: Result<T, TransportError>) -> Result<T, TransportError> {
        if let Err(e) = &result {
            self.terminated = true;
            error!(peer = %self.conn.peer_addr(), error = %e, in_flight = self.in_flight.len(), "stream terminated");
        }
        result
    }

    async fn send_request(&mut self, body: ExportBody) -> Result<u64, TransportError> {
        let request = ExportRequest::new(self.ids.next_id(), body);
        let payload = self.config.encoding.encode_request(&request)?;
        self.conn.send(payload).await?;
        self.in_flight.push_back(request.id);
        debug!(id = request.id, kind = request.body.kind(), in_flight = self.in_flight.len(), "request sent");

        let window = self.config.ack_window.get();
        while self.in_flight.len() >= window {
            self.await_ack().await?;
        }
        #[cfg(debug_assertions)]
        debug_assert_window_respected!(self.in_flight.len(), window);
        Ok(request.id)
    }

    async fn drain_acks(&mut self) -> Result<(), TransportError> {
        while !self.in_flight.is_empty() {
            self.await_ack().await?;
        }
        Ok(())
    }

    async fn await_ack(&mut self) -> Result<(), TransportError> {
        let frame = self.conn.recv().await?.ok_or(TransportError::PeerClosed)?;
        let ack = self.config.encoding.decode_ack(&frame)?;

        let expected = self.in_flight.front().copied().unwrap_or(0);
        if ack.id != expected {
            return Err(TransportError::AckMismatch {
                expected,
                received: ack.id,
            });
        }
        self.in_flight.pop_front();
        self.last_acked = ack.id;
        debug!(id = ack.id, "ack received");
        Ok(())
    }
}

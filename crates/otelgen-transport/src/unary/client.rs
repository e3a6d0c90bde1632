use super::{UnaryCall, UnaryReply};
use crate::config::ClientConfig;
use crate::error::{ProtocolViolation, TransportError};
use crate::frame::FrameConnection;
use otelgen::{ExportAck, ExportBody, ExportRequest, RequestIdSequence};
use std::fmt;
use tokio::net::ToSocketAddrs;
use tracing::{debug, info};

/// Client for the unary transport.
///
/// Each [`export`](Self::export) is an independent call that returns once
/// the server replies. Identifiers still count up from 1 per client, but the
/// server does not enforce their order.
pub struct UnaryClient {
    conn: FrameConnection,
    config: ClientConfig,
    ids: RequestIdSequence,
}

impl UnaryClient {
    /// Connects and performs the hello exchange.
    pub async fn connect<A>(endpoint: A, config: ClientConfig) -> Result<Self, TransportError>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let conn =
            FrameConnection::connect(endpoint, config.max_frame_length, config.io_timeout).await?;
        let mut client = Self {
            conn,
            config,
            ids: RequestIdSequence::new(),
        };
        client.hello().await?;
        info!(peer = %client.conn.peer_addr(), encoding = %client.config.encoding, "unary client connected");
        Ok(client)
    }

    /// Round trip with no payload.
    pub async fn hello(&mut self) -> Result<(), TransportError> {
        match self.call(&UnaryCall::Hello).await? {
            UnaryReply::Hello => Ok(()),
            UnaryReply::Export(_) => Err(ProtocolViolation::UnexpectedMessage("export reply to hello").into()),
        }
    }

    /// Sends one batch and waits for its acknowledgement.
    pub async fn export(&mut self, body: impl Into<ExportBody>) -> Result<ExportAck, TransportError> {
        let request = ExportRequest::new(self.ids.next_id(), body);
        self.export_request(request).await
    }

    /// Sends a request with a caller-chosen identifier.
    ///
    /// The reply must echo that identifier.
    pub async fn export_request(&mut self, request: ExportRequest) -> Result<ExportAck, TransportError> {
        let expected = request.id;
        let reply = self.call(&UnaryCall::Export(request)).await?;
        match reply {
            UnaryReply::Export(ack) if ack.id == expected => {
                debug!(id = ack.id, "export acknowledged");
                Ok(ack)
            }
            UnaryReply::Export(ack) => Err(TransportError::AckMismatch {
                expected,
                received: ack.id,
            }),
            UnaryReply::Hello => Err(ProtocolViolation::UnexpectedMessage("hello reply to export").into()),
        }
    }

    /// Closes the connection.
    pub async fn close(mut self) -> Result<(), TransportError> {
        self.conn.close().await
    }

    async fn call(&mut self, call: &UnaryCall) -> Result<UnaryReply, TransportError> {
        let payload = self.config.encoding.encode(call)?;
        self.conn.send(payload).await?;
        let frame = self.conn.recv().await?.ok_or(TransportError::PeerClosed)?;
        Ok(self.config.encoding.decode(&frame)?)
    }
}

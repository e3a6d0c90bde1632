//! Error types for transport operations.

use otelgen::CodecError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// A peer broke the request identifier rules.
///
/// Every variant is fatal for the connection: there is no resend or resync
/// path, so ordering cannot be re-established once it is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A request carried the reserved identifier 0.
    #[error("received reserved request id 0")]
    ReservedId,

    /// A request identifier skipped, repeated, or went backwards.
    #[error("received out of order request id {received}, expected {expected}")]
    OutOfOrder { expected: u64, received: u64 },

    /// A message arrived after the connection reached its terminal state.
    #[error("message received on terminated connection")]
    Terminated,

    /// A message of the wrong kind for the current exchange.
    #[error("unexpected message: {0}")]
    UnexpectedMessage(&'static str),
}

/// Errors that can occur while serving or exporting.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listening socket could not be bound.
    #[error("failed to listen on {endpoint}: {source}")]
    Bind { endpoint: String, source: io::Error },

    /// Accepting an inbound connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// Dialing the remote endpoint failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },

    /// Reading or writing a frame failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The peer broke the request identifier rules.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// An acknowledgement did not echo the expected request identifier.
    #[error("acknowledgement for request {received} while awaiting {expected}")]
    AckMismatch { expected: u64, received: u64 },

    /// The peer closed the connection while a reply was outstanding.
    #[error("connection closed by peer")]
    PeerClosed,

    /// The client was already ended by an earlier error.
    #[error("stream terminated by an earlier error")]
    Closed,

    /// A read or write exceeded the configured I/O timeout.
    #[error("i/o timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Returns `true` if the peer broke the identifier or message rules.
    ///
    /// Undecodable payloads count too, including frames the length codec
    /// rejects (`InvalidData`): the message cannot be trusted, so the
    /// connection ends exactly as for a bad identifier.
    #[inline]
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Protocol(_) | Self::AckMismatch { .. } | Self::Codec(_) => true,
            Self::Io(e) => e.kind() == io::ErrorKind::InvalidData,
            _ => false,
        }
    }

    /// Returns `true` if the error ends the server process rather than a
    /// single connection.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Accept(_))
    }
}

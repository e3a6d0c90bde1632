//! Request/response transport with no ordering across calls.
//!
//! Each call is one frame answered by one reply frame on the same
//! connection. The server does not track identifiers beyond rejecting the
//! reserved value 0, so independent callers may interleave freely.

mod client;
pub(crate) mod server;

pub use client::UnaryClient;

use otelgen::{ExportAck, ExportRequest};
use serde::{Deserialize, Serialize};

/// A call from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnaryCall {
    /// Reachability check; carries nothing.
    Hello,
    Export(ExportRequest),
}

/// The server's answer to a [`UnaryCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryReply {
    Hello,
    Export(ExportAck),
}

impl UnaryCall {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            UnaryCall::Hello => "hello",
            UnaryCall::Export(_) => "export",
        }
    }
}

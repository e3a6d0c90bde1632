//! Persistent bidirectional stream with strict, gapless request ordering.
//!
//! One connection carries requests `1, 2, 3, ...`, each answered by an
//! acknowledgement echoing its identifier. The server rejects identifier 0 or
//! any gap fatally; the client never has more than its window of
//! unacknowledged requests outstanding.

mod client;
mod ordering;
pub(crate) mod server;

pub use client::StreamClient;
pub use ordering::{ConnectionState, OrderingGuard};

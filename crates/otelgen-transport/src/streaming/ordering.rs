//! Per-connection ordering state machine.
//!
//! Pure bookkeeping with no I/O, so it can be exercised in isolation. The
//! server consults it for every decoded request before anything else happens.

#[cfg(debug_assertions)]
use crate::invariants::debug_assert_gapless;
use crate::error::ProtocolViolation;
use otelgen::RESERVED_REQUEST_ID;

/// Ordering state of one streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Ready for the request after `last_accepted_id` (0 before the first).
    Awaiting { last_accepted_id: u64 },
    /// A fatal error or shutdown ended the connection.
    Terminal,
}

/// Validates request identifiers on one streaming connection.
#[derive(Debug)]
pub struct OrderingGuard {
    state: ConnectionState,
    accepted: u64,
}

impl Default for OrderingGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderingGuard {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Awaiting { last_accepted_id: 0 },
            accepted: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of requests accepted, kept across termination.
    ///
    /// Acceptance is gapless from 1, so this is also the highest identifier
    /// accepted.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Accepts `id` if it directly follows the last accepted identifier.
    ///
    /// Any violation moves the guard to [`ConnectionState::Terminal`] for
    /// good.
    pub fn accept(&mut self, id: u64) -> Result<(), ProtocolViolation> {
        let last = match self.state {
            ConnectionState::Awaiting { last_accepted_id } => last_accepted_id,
            ConnectionState::Terminal => return Err(ProtocolViolation::Terminated),
        };

        if id == RESERVED_REQUEST_ID {
            self.state = ConnectionState::Terminal;
            return Err(ProtocolViolation::ReservedId);
        }

        match last.checked_add(1) {
            Some(expected) if expected == id => {
                self.state = ConnectionState::Awaiting { last_accepted_id: id };
                self.accepted += 1;
                #[cfg(debug_assertions)]
                debug_assert_gapless!(last, id);
                Ok(())
            }
            expected => {
                self.state = ConnectionState::Terminal;
                Err(ProtocolViolation::OutOfOrder {
                    expected: expected.unwrap_or(RESERVED_REQUEST_ID),
                    received: id,
                })
            }
        }
    }

    /// Ends the connection without a violation (shutdown, decode failure).
    pub fn terminate(&mut self) {
        self.state = ConnectionState::Terminal;
    }
}

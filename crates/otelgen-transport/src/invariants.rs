//! Debug assertion macros for the request/acknowledgement protocol.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// Gapless acceptance
// =============================================================================

/// Assert that an accepted identifier directly follows the previous one.
///
/// **Invariant**: `accepted(id) → id == last_accepted_id + 1`
///
/// Used in: `OrderingGuard::accept()` after the state transition
macro_rules! debug_assert_gapless {
    ($previous:expr, $accepted:expr) => {
        debug_assert!(
            $accepted != 0 && $previous.checked_add(1) == Some($accepted),
            "accepted request id {} does not follow {}",
            $accepted,
            $previous
        )
    };
}

// =============================================================================
// Bounded in-flight window
// =============================================================================

/// Assert that the client never exceeds its acknowledgement window.
///
/// **Invariant**: `in_flight.len() <= ack_window`
///
/// Used in: `StreamClient::export()` after each send
macro_rules! debug_assert_window_respected {
    ($in_flight:expr, $window:expr) => {
        debug_assert!(
            $in_flight <= $window,
            "{} requests in flight exceeds window {}",
            $in_flight,
            $window
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_gapless;
pub(crate) use debug_assert_window_respected;

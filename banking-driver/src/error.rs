//! Errors visible above [`crate::TurnDriver::run_turn`].
//!
//! `run_turn` itself is infallible (§7: "no exception propagates out of
//! a worker to the driver"; every worker failure is recovered locally
//! and recorded on `TurnState::error_message`). The only failure mode
//! that can reach a caller is the session-store round-trip a transport
//! layer performs around a turn.

use banking_protocol::error::StateError;
use thiserror::Error;

/// Failure from the session-level turn wrapper.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Reading or writing the session's conversation state failed.
    #[error("session state store error: {0}")]
    Store(#[from] StateError),
}

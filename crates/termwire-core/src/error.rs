//! Error types for the connection state machine.
//!
//! None of these are fatal to the process: every failure leaves the manager in
//! a state from which the user can connect or reconnect again.

use thiserror::Error;

use crate::connection::Phase;

/// Errors that can occur during connection state machine operations.
///
/// Encoding an outbound envelope is not represented here: a line that cannot
/// be encoded is logged and dropped, the same as a send outside `Open`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Operation not valid in the current phase.
    ///
    /// Expected when user input races socket events, and safe to drop after
    /// logging.
    #[error("invalid state transition: cannot {operation} from {phase:?}")]
    InvalidState {
        /// Phase when the operation was attempted
        phase: Phase,
        /// Operation that was attempted
        operation: String,
    },
}

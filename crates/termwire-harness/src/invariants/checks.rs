//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use termwire_core::Phase;

use super::{Invariant, InvariantKind, InvariantResult, SessionSnapshot, Violation};

/// A socket exists exactly in `Connecting`, `Open` and `Closing`.
///
/// A socket handle outliving `Closed` would let a stale callback act on the
/// session; a missing one in `Open` would drop every send.
pub struct SocketMatchesPhase;

impl Invariant for SocketMatchesPhase {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SocketMatchesPhase
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.socket.is_some() == state.phase.has_socket() {
            return Ok(());
        }
        Err(Violation {
            invariant: self.kind(),
            message: format!("phase {:?} with socket {:?}", state.phase, state.socket),
        })
    }
}

/// The loading indicator only shows while a requested close is in flight.
pub struct BusyOnlyWhileClosing;

impl Invariant for BusyOnlyWhileClosing {
    fn kind(&self) -> InvariantKind {
        InvariantKind::BusyOnlyWhileClosing
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if !state.busy || state.phase == Phase::Closing {
            return Ok(());
        }
        Err(Violation {
            invariant: self.kind(),
            message: format!("busy in phase {:?}", state.phase),
        })
    }
}

/// An automatic reconnect can only be waiting while the session is closed.
pub struct ReconnectOnlyWhenClosed;

impl Invariant for ReconnectOnlyWhenClosed {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ReconnectOnlyWhenClosed
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if !state.pending_reconnect || state.phase == Phase::Closed {
            return Ok(());
        }
        Err(Violation {
            invariant: self.kind(),
            message: format!("reconnect pending in phase {:?}", state.phase),
        })
    }
}

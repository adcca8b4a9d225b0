//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::{ops::Sub, time::Duration};

use termwire_app::SessionBridge;
use termwire_core::{Phase, SocketId};

/// Snapshot of one session bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Connection phase.
    pub phase: Phase,
    /// Current socket.
    pub socket: Option<SocketId>,
    /// Automatic reconnect scheduled.
    pub pending_reconnect: bool,
    /// Loading indicator showing.
    pub busy: bool,
    /// Bridge torn down.
    pub disposed: bool,
    /// Characters in the editor line.
    pub line_len: usize,
}

impl SessionSnapshot {
    /// Snapshot of a manager that never connected.
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            socket: None,
            pending_reconnect: false,
            busy: false,
            disposed: false,
            line_len: 0,
        }
    }

    /// Capture the observable state of `bridge`.
    pub fn from_bridge<I>(bridge: &SessionBridge<I>) -> Self
    where
        I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
    {
        let connection = bridge.connection();
        Self {
            phase: connection.phase(),
            socket: connection.socket(),
            pending_reconnect: connection.pending_reconnect(),
            busy: bridge.is_busy(),
            disposed: bridge.is_disposed(),
            line_len: bridge.editor().buffer().chars().count(),
        }
    }
}

//! Runtime input events.
//!
//! This module defines [`AppEvent`], everything a [`crate::Driver`] can hand
//! to the [`crate::Runtime`].
//!
//! Events originate from three sources:
//! - The keyboard and the periodic tick.
//! - The transport, reporting on a socket.
//! - The shell owning the bridge (reconnect, disconnect, quit).

use termwire_core::ConnectionEvent;
use termwire_proto::CloseCode;

use crate::KeyInput;

/// Events processed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Something happened on a socket.
    Socket(ConnectionEvent),

    /// Periodic tick.
    Tick,

    /// Owner asked for a reconnect.
    Reconnect,

    /// Owner asked for a disconnect with this code.
    Disconnect(CloseCode),

    /// Owner is done with the session.
    Quit,
}

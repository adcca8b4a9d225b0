//! Bridge side-effects.
//!
//! This module defines the [`BridgeAction`] enum, the instructions produced by
//! the [`crate::SessionBridge`] for the runtime to execute against its
//! [`crate::Driver`].

use termwire_core::SocketId;
use termwire_proto::{CloseCode, CloseReason};

/// Actions produced by the session bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeAction {
    /// Write text to the display sink.
    Display(String),

    /// Open a socket.
    Open {
        /// Identity to report events under.
        socket: SocketId,
        /// Endpoint URL.
        url: String,
    },

    /// Send one message on a socket.
    Send {
        /// Target socket.
        socket: SocketId,
        /// Encoded envelope.
        text: String,
    },

    /// Start the closing handshake on a socket.
    Close {
        /// Target socket.
        socket: SocketId,
        /// Close code.
        code: CloseCode,
        /// Close reason text.
        reason: String,
    },

    /// The session's socket closed.
    SessionClosed {
        /// Why it closed.
        reason: CloseReason,
        /// A reconnect is already on its way; no need to alert.
        awaiting_reconnect: bool,
    },

    /// Show or hide the loading indicator.
    Busy(bool),

    /// Release the display sink. Always the last action of a bridge.
    Dispose,
}

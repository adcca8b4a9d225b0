//! Termwire core
//!
//! Sans-IO connection lifecycle for one remote session. The
//! [`ConnectionManager`] owns the socket identity and the phase of the
//! connection; it consumes [`ConnectionEvent`]s together with the current time
//! and returns [`ConnectionAction`]s for a driver to execute. It never performs
//! I/O itself, so the same code runs against a real WebSocket and against the
//! simulation harness.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod error;

pub use connection::{
    BootstrapCommands, ConnectionAction, ConnectionConfig, ConnectionEvent, ConnectionManager,
    DEFAULT_ENDPOINT, Notices, Phase, SocketId,
};
pub use error::ConnectionError;

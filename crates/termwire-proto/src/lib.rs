//! Termwire wire protocol
//!
//! Value types shared by every layer of a remote-session bridge: the session
//! target, the outbound message envelope and the WebSocket close-code
//! taxonomy.
//!
//! The protocol is asymmetric. Requests sent to the remote service are
//! structured JSON [`Envelope`]s; responses are unstructured text streamed
//! straight to the display (see [`decode_inbound`]).
//!
//! # Components
//!
//! - [`SessionTarget`] / [`SessionKind`]: what a bridge connects to
//! - [`Envelope`]: outbound request unit (`type`, `data`, `target`)
//! - [`CloseCode`] / [`CloseReason`]: why a socket closed and who closed it

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod close;
pub mod envelope;
pub mod errors;
pub mod session;

pub use close::{CloseCode, CloseOrigin, CloseReason};
pub use envelope::{Envelope, decode_inbound, encode_line};
pub use errors::{ProtocolError, Result};
pub use session::{SessionKind, SessionTarget};

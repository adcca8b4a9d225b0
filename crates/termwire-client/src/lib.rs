//! Termwire client
//!
//! Real I/O for the Sans-IO [`termwire_core::ConnectionManager`]. The manager
//! decides when sockets open, send and close; this crate carries those
//! decisions out over WebSocket and reports what happened back as
//! [`termwire_core::ConnectionEvent`]s tagged with the socket they belong to.
//!
//! # Components
//!
//! - [`Transport`]: owns the socket tasks, executes `Open`/`Send`/`Close`
//! - [`TransportError`]: failures addressing a socket

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod transport;

pub use transport::{Transport, TransportError};

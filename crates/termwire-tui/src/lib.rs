//! Terminal shell for termwire
//!
//! A thin shell over [`termwire_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`termwire_app::Runtime`].
//!
//! This crate only handles the terminal, argument validation and logging.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod address;
pub mod logging;
pub mod terminal;

pub use address::{InvalidAddress, validate_address};
pub use termwire_app::{AppEvent, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};

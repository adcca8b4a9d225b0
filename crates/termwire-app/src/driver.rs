//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use termwire_core::SocketId;
use termwire_proto::CloseCode;

use crate::AppEvent;

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal shell and in simulation.
///
/// Socket operations are fire-and-forget: their outcome comes back later as
/// [`AppEvent::Socket`] events from [`Driver::poll_event`].
///
/// # Implementations
///
/// - **Terminal**: crossterm for keys and display, tokio-tungstenite sockets
/// - **Simulation**: scripted events, recorded actions, virtual time
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Wait for the next input event.
    ///
    /// Returns `None` once the input source is exhausted, which ends the
    /// runtime like [`AppEvent::Quit`] does.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Start opening a socket to `url`, reporting its events as `socket`.
    fn open(&mut self, socket: SocketId, url: &str) -> Result<(), Self::Error>;

    /// Send one text message on `socket`.
    fn send(&mut self, socket: SocketId, text: String) -> Result<(), Self::Error>;

    /// Start the closing handshake on `socket`.
    fn close(&mut self, socket: SocketId, code: CloseCode, reason: String)
    -> Result<(), Self::Error>;

    /// Write text to the display sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the display is gone.
    fn write(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Show or hide the loading indicator.
    fn set_busy(&mut self, busy: bool);

    /// Tell the user the session ended unexpectedly.
    fn alert(&mut self, message: &str) -> Result<(), Self::Error>;

    /// Release the display sink.
    fn dispose(&mut self);

    /// Give socket work queued by teardown a chance to finish.
    ///
    /// Awaited once, after the teardown actions ran. A close frame requested
    /// during teardown must reach the wire before this resolves, or be given
    /// up on after a bounded wait.
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Current time instant.
    fn now(&self) -> Self::Instant;
}

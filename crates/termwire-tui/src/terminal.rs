//! Terminal driver for the shell.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and the raw byte stream for display. Sockets go through
//! the tokio-tungstenite [`Transport`].

use std::{
    io::{self, Stdout, Write, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    execute, queue,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{SetTitle, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use termwire_app::{AppEvent, Driver, KeyInput};
use termwire_client::{Transport, TransportError};
use termwire_core::{ConnectionEvent, SocketId};
use termwire_proto::CloseCode;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{Interval, MissedTickBehavior, interval},
};

/// Tick period driving timeouts and scheduled reconnects.
const TICK: Duration = Duration::from_millis(100);

/// How long closing handshakes may take once the session is over.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const TITLE: &str = "termwire";
const TITLE_BUSY: &str = "termwire (closing...)";

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns raw mode for its lifetime: raw mode is entered on construction and
/// left on [`Driver::dispose`] or drop, whichever comes first.
pub struct TerminalDriver {
    out: Stdout,
    event_stream: EventStream,
    transport: Transport,
    socket_events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ticker: Interval,
    raw: bool,
}

impl TerminalDriver {
    /// Create a new terminal driver and enter raw mode.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, SetTitle(TITLE))?;

        let (transport, socket_events) = Transport::new();
        let mut ticker = interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(Self {
            out,
            event_stream: EventStream::new(),
            transport,
            socket_events,
            ticker,
            raw: true,
        })
    }

    /// Translate a key press into a runtime event.
    ///
    /// Control chords drive the session; everything else goes to the editor.
    pub(crate) fn convert_key(key: KeyEvent) -> Option<AppEvent> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('r') => Some(AppEvent::Reconnect),
                KeyCode::Char('d') => Some(AppEvent::Disconnect(CloseCode::NORMAL)),
                KeyCode::Char('c') => Some(AppEvent::Quit),
                _ => None,
            };
        }

        let input = match key.code {
            KeyCode::Esc => return Some(AppEvent::Quit),
            KeyCode::Char(c) => KeyInput::Char(c),
            KeyCode::Enter => KeyInput::Enter,
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Delete => KeyInput::Delete,
            KeyCode::Tab => KeyInput::Tab,
            KeyCode::Left => KeyInput::Left,
            KeyCode::Right => KeyInput::Right,
            KeyCode::Up => KeyInput::Up,
            KeyCode::Down => KeyInput::Down,
            KeyCode::Home => KeyInput::Home,
            KeyCode::End => KeyInput::End,
            _ => return None,
        };
        Some(AppEvent::Key(input))
    }

    fn restore(&mut self) {
        if std::mem::take(&mut self.raw)
            && let Err(e) = disable_raw_mode()
        {
            tracing::warn!(error = %e, "failed to leave raw mode");
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        loop {
            tokio::select! {
                biased;

                // Socket events first so a close is seen before more typing
                Some(event) = self.socket_events.recv() => {
                    if let ConnectionEvent::Closed { socket, .. } = &event {
                        self.transport.release(*socket);
                    }
                    return Ok(Some(AppEvent::Socket(event)));
                }

                // Terminal events
                maybe_event = self.event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            if let Some(event) = Self::convert_key(key) {
                                return Ok(Some(event));
                            }
                        },
                        Some(Ok(_)) => {},
                        Some(Err(e)) => return Err(TerminalError::Io(e)),
                        None => return Ok(None),
                    }
                }

                _ = self.ticker.tick() => return Ok(Some(AppEvent::Tick)),
            }
        }
    }

    fn open(&mut self, socket: SocketId, url: &str) -> Result<(), Self::Error> {
        self.transport.open(socket, url);
        Ok(())
    }

    fn send(&mut self, socket: SocketId, text: String) -> Result<(), Self::Error> {
        Ok(self.transport.send(socket, text)?)
    }

    fn close(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: String,
    ) -> Result<(), Self::Error> {
        Ok(self.transport.close(socket, code, reason)?)
    }

    fn write(&mut self, text: &str) -> Result<(), Self::Error> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn set_busy(&mut self, busy: bool) {
        let title = if busy { TITLE_BUSY } else { TITLE };
        if let Err(e) = execute!(self.out, SetTitle(title)) {
            tracing::debug!(error = %e, busy, "failed to update title");
        }
    }

    fn alert(&mut self, message: &str) -> Result<(), Self::Error> {
        queue!(
            self.out,
            Print("\r\n"),
            SetForegroundColor(Color::Yellow),
            Print(format!("! {message}")),
            ResetColor,
            Print("\r\n"),
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn dispose(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::debug!(error = %e, "final flush failed");
        }
        self.restore();
    }

    async fn shutdown(&mut self) {
        self.transport.shutdown(SHUTDOWN_GRACE).await;
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        // Only tasks that escaped shutdown are left here
        self.transport.stop();
        self.restore();
    }
}

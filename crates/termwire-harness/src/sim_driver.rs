//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`termwire_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Time is virtual: it only moves when the script says so. Socket operations
//! are recorded, and can optionally be answered the way a well-behaved
//! service would (open succeeds, close is acknowledged).

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use termwire_app::{AppEvent, Driver, KeyInput};
use termwire_core::{ConnectionEvent, SocketId};
use termwire_proto::CloseCode;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One step of a script.
#[derive(Debug, Clone)]
enum Step {
    Event(AppEvent),
    Advance(Duration),
}

/// A close request recorded by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedClose {
    /// Socket asked to close.
    pub socket: SocketId,
    /// Close code.
    pub code: CloseCode,
    /// Close reason text.
    pub reason: String,
}

/// Shared state for event injection.
///
/// This allows injection and inspection from outside the runtime.
#[derive(Default)]
struct SharedState {
    script: VecDeque<Step>,
    responses: VecDeque<AppEvent>,
    elapsed: Duration,
    auto_open: bool,
    auto_close: bool,
    fail_next_write: bool,
    opens: Vec<(SocketId, String)>,
    sends: Vec<(SocketId, String)>,
    closes: Vec<RecordedClose>,
    transcript: String,
    alerts: Vec<String>,
    busy: Vec<bool>,
    disposed: usize,
    closes_at_shutdown: Vec<usize>,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state: keep one clone in the test to inspect what the
/// runtime did after it consumed the other.
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    epoch: Instant,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a new simulation driver.
    #[allow(clippy::disallowed_methods)]
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(SharedState::default())), epoch: Instant::now() }
    }

    /// Answer every open with `Opened` for that socket.
    #[must_use]
    pub fn with_auto_open(self) -> Self {
        self.state().auto_open = true;
        self
    }

    /// Answer every close with `Closed` carrying the requested code.
    #[must_use]
    pub fn with_auto_close(self) -> Self {
        self.state().auto_close = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an event.
    pub fn inject_event(&self, event: AppEvent) {
        self.state().script.push_back(Step::Event(event));
    }

    /// Queue a keystroke.
    pub fn inject_key(&self, key: KeyInput) {
        self.inject_event(AppEvent::Key(key));
    }

    /// Queue typing `line` followed by Enter.
    pub fn inject_line(&self, line: &str) {
        for c in line.chars() {
            self.inject_key(KeyInput::Char(c));
        }
        self.inject_key(KeyInput::Enter);
    }

    /// Queue an event reported by the transport.
    pub fn inject_socket(&self, event: ConnectionEvent) {
        self.inject_event(AppEvent::Socket(event));
    }

    /// Queue a tick.
    pub fn inject_tick(&self) {
        self.inject_event(AppEvent::Tick);
    }

    /// Queue a jump of the virtual clock.
    pub fn advance(&self, by: Duration) {
        self.state().script.push_back(Step::Advance(by));
    }

    /// Make the next display write fail.
    pub fn fail_next_write(&self) {
        self.state().fail_next_write = true;
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        let state = self.state();
        !state.script.is_empty() || !state.responses.is_empty()
    }

    /// Sockets opened, with their URLs, in order.
    pub fn opens(&self) -> Vec<(SocketId, String)> {
        self.state().opens.clone()
    }

    /// Messages sent, in order.
    pub fn sends(&self) -> Vec<(SocketId, String)> {
        self.state().sends.clone()
    }

    /// Close requests, in order.
    pub fn closes(&self) -> Vec<RecordedClose> {
        self.state().closes.clone()
    }

    /// Everything written to the display.
    pub fn transcript(&self) -> String {
        self.state().transcript.clone()
    }

    /// Alerts raised.
    pub fn alerts(&self) -> Vec<String> {
        self.state().alerts.clone()
    }

    /// Loading indicator changes, in order.
    pub fn busy_history(&self) -> Vec<bool> {
        self.state().busy.clone()
    }

    /// How many times the display was disposed.
    pub fn dispose_count(&self) -> usize {
        self.state().disposed
    }

    /// For each shutdown, how many closes had been requested before it.
    pub fn closes_at_shutdown(&self) -> Vec<usize> {
        self.state().closes_at_shutdown.clone()
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.state().elapsed
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        let mut state = self.state();

        if let Some(event) = state.responses.pop_front() {
            return Ok(Some(event));
        }

        while let Some(step) = state.script.pop_front() {
            match step {
                Step::Event(event) => return Ok(Some(event)),
                Step::Advance(by) => state.elapsed += by,
            }
        }

        Ok(None)
    }

    fn open(&mut self, socket: SocketId, url: &str) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.opens.push((socket, url.to_string()));
        if state.auto_open {
            state.responses.push_back(AppEvent::Socket(ConnectionEvent::Opened { socket }));
        }
        Ok(())
    }

    fn send(&mut self, socket: SocketId, text: String) -> Result<(), Self::Error> {
        self.state().sends.push((socket, text));
        Ok(())
    }

    fn close(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: String,
    ) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.closes.push(RecordedClose { socket, code, reason });
        if state.auto_close {
            state.responses.push_back(AppEvent::Socket(ConnectionEvent::Closed { socket, code }));
        }
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), Self::Error> {
        let mut state = self.state();
        if std::mem::take(&mut state.fail_next_write) {
            return Err(SimDriverError("display write failed".into()));
        }
        state.transcript.push_str(text);
        Ok(())
    }

    fn set_busy(&mut self, busy: bool) {
        self.state().busy.push(busy);
    }

    fn alert(&mut self, message: &str) -> Result<(), Self::Error> {
        self.state().alerts.push(message.to_string());
        Ok(())
    }

    fn dispose(&mut self) {
        self.state().disposed += 1;
    }

    async fn shutdown(&mut self) {
        let mut state = self.state();
        let closes = state.closes.len();
        state.closes_at_shutdown.push(closes);
    }

    fn now(&self) -> Self::Instant {
        self.epoch + self.state().elapsed
    }
}

//! Connection lifecycle state machine.
//!
//! Owns the socket of one session bridge and drives it through its lifecycle.
//! Uses the action pattern: methods take time as input and return actions for
//! the driver to execute. This keeps the state machine pure (no I/O) and makes
//! testing straightforward.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐  Opened   ┌──────┐
//! │ Idle │────────>│ Connecting │──────────>│ Open │
//! └──────┘         └────────────┘           └──────┘
//!                    │        │ disconnect     │ disconnect
//!                    │        ↓                ↓
//!                    │      ┌─────────┐<───────┘
//!                    │      │ Closing │
//!                    │      └─────────┘
//!                    │ Closed/Error │ Closed/Error
//!                    ↓              ↓
//!                  ┌────────────────────┐
//!                  │       Closed       │──── connect / reconnect ───> Connecting
//!                  └────────────────────┘
//! ```
//!
//! `Open` also moves straight to `Closed` when the server closes or the
//! transport fails.
//!
//! # Socket identity
//!
//! Every socket the manager asks the driver to open gets a fresh
//! [`SocketId`]. Events carry the id of the socket that produced them, and an
//! event whose id is not the current socket is discarded. A reconnect therefore
//! abandons the old socket outright: its late `Opened` or `Closed` can never
//! touch the state of the newer connection.

use std::{
    fmt,
    ops::Sub,
    time::{Duration, Instant},
};

use termwire_proto::{
    CloseCode, CloseReason, Envelope, SessionKind, SessionTarget, decode_inbound,
};

use crate::error::ConnectionError;

/// Base URL of the local session service.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080";

/// Bootstrap command sent when a log session opens.
pub const DEFAULT_LOG_COMMAND: &str = "tail -f /var/log/php.log /var/log/apache/error.log";

/// Bootstrap command sent when a process session opens.
pub const DEFAULT_PROCESS_COMMAND: &str = "ps aux";

/// Identity of one socket opened by a [`ConnectionManager`].
///
/// Ids are allocated from a per-manager generation counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    /// Wrap a raw generation number.
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Raw generation number.
    pub const fn generation(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Never connected.
    Idle,
    /// Socket requested, not yet open.
    Connecting,
    /// Socket open, bootstrap sent.
    Open,
    /// Close requested, waiting for the transport to confirm.
    Closing,
    /// Socket gone. Waiting for an explicit connect or reconnect.
    Closed,
}

impl Phase {
    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle | Phase::Closed, Phase::Connecting)
                | (Phase::Connecting, Phase::Open | Phase::Closing | Phase::Closed)
                | (Phase::Open, Phase::Closing | Phase::Closed)
                | (Phase::Closing, Phase::Closed)
        )
    }

    /// Phases in which a socket handle exists.
    pub fn has_socket(self) -> bool {
        matches!(self, Phase::Connecting | Phase::Open | Phase::Closing)
    }
}

/// Events fed into the manager by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The transport finished the opening handshake.
    Opened {
        /// Socket that opened.
        socket: SocketId,
    },

    /// Text received from the service.
    Message {
        /// Socket the text arrived on.
        socket: SocketId,
        /// Raw terminal text.
        text: String,
    },

    /// The transport failed (open failure or mid-session error).
    Error {
        /// Socket that failed.
        socket: SocketId,
        /// Transport error description.
        message: String,
    },

    /// The socket is closed, whoever initiated it.
    Closed {
        /// Socket that closed.
        socket: SocketId,
        /// Close code reported by the transport.
        code: CloseCode,
    },

    /// Periodic tick for timeouts and scheduled reconnects.
    Tick,
}

impl ConnectionEvent {
    /// Socket the event belongs to. `None` for ticks.
    pub fn socket(&self) -> Option<SocketId> {
        match self {
            Self::Opened { socket }
            | Self::Message { socket, .. }
            | Self::Error { socket, .. }
            | Self::Closed { socket, .. } => Some(*socket),
            Self::Tick => None,
        }
    }
}

/// Actions returned by the connection state machine.
///
/// The driver executes these in order:
/// - `Display`: write text to the display sink
/// - `Open`: open a WebSocket to `url` and report its events as `socket`
/// - `Send`: send one text message on `socket`
/// - `Close`: start the closing handshake on `socket` (even if not yet open)
/// - `Closed`: the connection ended; the owner decides how to present it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Write text to the display.
    Display(String),

    /// Open a new socket.
    Open {
        /// Identity to report events under.
        socket: SocketId,
        /// Endpoint URL.
        url: String,
    },

    /// Send one message.
    Send {
        /// Target socket.
        socket: SocketId,
        /// Encoded envelope.
        text: String,
    },

    /// Request a close.
    Close {
        /// Target socket.
        socket: SocketId,
        /// Close code, passed through unchanged.
        code: CloseCode,
        /// Close reason text.
        reason: String,
    },

    /// The current connection reached `Closed`.
    Closed {
        /// Why it closed.
        reason: CloseReason,
        /// An automatic reconnect is scheduled.
        reconnect_pending: bool,
    },
}

/// Default command sent on open, per session kind.
///
/// `None` sends a bootstrap envelope with a `null` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapCommands {
    /// Command for [`SessionKind::Log`].
    pub log: Option<String>,
    /// Command for [`SessionKind::Process`].
    pub process: Option<String>,
    /// Command for [`SessionKind::Generic`].
    pub generic: Option<String>,
}

impl Default for BootstrapCommands {
    fn default() -> Self {
        Self {
            log: Some(DEFAULT_LOG_COMMAND.to_string()),
            process: Some(DEFAULT_PROCESS_COMMAND.to_string()),
            generic: None,
        }
    }
}

impl BootstrapCommands {
    /// Command for `kind`.
    pub fn for_kind(&self, kind: SessionKind) -> Option<&str> {
        match kind {
            SessionKind::Log => self.log.as_deref(),
            SessionKind::Process => self.process.as_deref(),
            SessionKind::Generic => self.generic.as_deref(),
        }
    }
}

/// Text written to the display on lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notices {
    /// Banner written on connect. `{address}` is replaced by the target.
    pub banner: String,
    /// Written when the transport reports an error.
    pub error: String,
    /// Written when the socket closes.
    pub closed: String,
    /// Written when a connect attempt times out.
    pub timeout: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            banner: "Connecting to \x1b[1;3;31m{address}\x1b[0m \r\n".to_string(),
            error: "\r\nConnection error.\r\n".to_string(),
            closed: "\r\nConnection closed.\r\n".to_string(),
            timeout: "\r\nConnection timed out.\r\n".to_string(),
        }
    }
}

impl Notices {
    /// Banner for `address`.
    pub fn banner_for(&self, address: &str) -> String {
        self.banner.replace("{address}", address)
    }
}

/// Connection configuration.
///
/// Everything a manager writes or sends that is not user input comes from
/// here; there is no process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL; the session kind's segment is appended.
    pub endpoint: String,
    /// Display notices.
    pub notices: Notices,
    /// Per-kind bootstrap commands.
    pub bootstrap: BootstrapCommands,
    /// Reason text sent with a user close.
    pub close_reason: String,
    /// Reason text sent when a reconnect abandons a socket.
    pub reconnect_reason: String,
    /// Give up on a connect attempt after this long. `None` waits for the
    /// transport to report failure.
    pub connect_timeout: Option<Duration>,
    /// Reconnect this long after an unexpected close. `None` never
    /// reconnects on its own.
    pub auto_reconnect: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            notices: Notices::default(),
            bootstrap: BootstrapCommands::default(),
            close_reason: "User actively closed the connection.".to_string(),
            reconnect_reason: "Reconnecting".to_string(),
            connect_timeout: None,
            auto_reconnect: None,
        }
    }
}

impl ConnectionConfig {
    /// Sets the service base URL.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enables automatic reconnect after unexpected closes.
    #[must_use]
    pub fn auto_reconnect(mut self, delay: Duration) -> Self {
        self.auto_reconnect = Some(delay);
        self
    }

    /// Endpoint URL for `kind`.
    pub fn url_for(&self, kind: SessionKind) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), kind.endpoint_segment())
    }
}

/// Connection lifecycle state machine.
///
/// Owns the phase, the current socket identity and the reconnect schedule.
/// Only the manager's own operations change them.
///
/// This is a pure state machine - no I/O, no clock of its own.
/// Time is passed as parameters to methods that need it.
///
/// # Invariants
///
/// - `socket().is_some()` exactly when `phase().has_socket()`.
/// - Every phase change follows [`Phase::can_transition_to`].
/// - Socket ids strictly increase.
#[derive(Debug, Clone)]
pub struct ConnectionManager<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Current phase
    phase: Phase,
    /// Current socket, if any
    socket: Option<SocketId>,
    /// Next socket generation
    next_generation: u64,
    /// The current socket's close was requested locally
    close_requested: bool,
    /// Automatic reconnect scheduled
    pending_reconnect: bool,
    /// Target of the most recent connect
    target: Option<SessionTarget>,
    /// When the current connect attempt started
    connect_started: Option<I>,
    /// When the last unexpected close happened
    closed_at: Option<I>,
    /// Configuration
    config: ConnectionConfig,
}

impl<I> ConnectionManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a manager in [`Phase::Idle`].
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            phase: Phase::Idle,
            socket: None,
            next_generation: 1,
            close_requested: false,
            pending_reconnect: false,
            target: None,
            connect_started: None,
            closed_at: None,
            config,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current socket. `None` outside `Connecting`, `Open` and `Closing`.
    #[must_use]
    pub fn socket(&self) -> Option<SocketId> {
        self.socket
    }

    /// Whether an automatic reconnect is scheduled.
    #[must_use]
    pub fn pending_reconnect(&self) -> bool {
        self.pending_reconnect
    }

    /// Target of the most recent connect.
    #[must_use]
    pub fn target(&self) -> Option<&SessionTarget> {
        self.target.as_ref()
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a socket to the service for `target`.
    ///
    /// Writes the connecting banner and asks the driver to open the socket.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless in `Idle` or `Closed`
    pub fn connect(
        &mut self,
        target: SessionTarget,
        now: I,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if !matches!(self.phase, Phase::Idle | Phase::Closed) {
            return Err(ConnectionError::InvalidState {
                phase: self.phase,
                operation: "connect".to_string(),
            });
        }

        Ok(self.open_socket(target, now))
    }

    /// Drop the current socket (if any) and connect again.
    ///
    /// A no-op while a connect attempt is already in flight. From `Open` the
    /// old socket is sent a normal close and abandoned; whatever it reports
    /// later is discarded as stale.
    pub fn reconnect(&mut self, target: SessionTarget, now: I) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        match self.phase {
            Phase::Connecting => {
                tracing::debug!(socket = ?self.socket, "reconnect ignored, already connecting");
                return actions;
            },
            Phase::Open | Phase::Closing => {
                if let Some(old) = self.socket.take() {
                    if !self.close_requested {
                        actions.push(ConnectionAction::Close {
                            socket: old,
                            code: CloseCode::NORMAL,
                            reason: self.config.reconnect_reason.clone(),
                        });
                    }
                    tracing::info!(socket = %old, "abandoning socket for reconnect");
                }
                if self.phase == Phase::Open {
                    self.transition(Phase::Closing);
                }
                self.transition(Phase::Closed);
            },
            Phase::Idle | Phase::Closed => {},
        }

        actions.extend(self.open_socket(target, now));
        actions
    }

    /// Start the closing handshake with `code`.
    ///
    /// The close is issued against the current socket even if it has not
    /// opened yet, so an in-flight connection is never leaked. Codes other
    /// than 1000/1001/1006 are passed through unchanged.
    ///
    /// Also cancels a scheduled automatic reconnect.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless in `Connecting` or `Open`
    pub fn disconnect(&mut self, code: CloseCode) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.pending_reconnect {
            tracing::info!("scheduled reconnect cancelled");
            self.pending_reconnect = false;
            self.closed_at = None;
        }

        let socket = match (self.phase, self.socket) {
            (Phase::Connecting | Phase::Open, Some(socket)) => socket,
            _ => {
                return Err(ConnectionError::InvalidState {
                    phase: self.phase,
                    operation: "disconnect".to_string(),
                });
            },
        };

        if !code.is_recognized() {
            tracing::debug!(%code, "passing through unrecognized close code");
        }

        self.close_requested = true;
        self.connect_started = None;
        self.transition(Phase::Closing);

        Ok(vec![ConnectionAction::Close {
            socket,
            code,
            reason: self.config.close_reason.clone(),
        }])
    }

    /// Send a submitted input line.
    ///
    /// Only valid in `Open`. Anywhere else the line is dropped: keystrokes can
    /// race a socket that has not opened yet, and that is not an error.
    pub fn send(&self, line: &str) -> Vec<ConnectionAction> {
        let (Phase::Open, Some(socket), Some(target)) = (self.phase, self.socket, &self.target)
        else {
            tracing::debug!(phase = ?self.phase, "dropping line, socket not open");
            return vec![];
        };

        match Envelope::command(target, line).encode() {
            Ok(text) => vec![ConnectionAction::Send { socket, text }],
            Err(e) => {
                tracing::warn!(%socket, error = %e, "failed to encode line");
                vec![]
            },
        }
    }

    /// Process one event.
    ///
    /// Single entry point for everything the transport reports, plus ticks.
    /// Socket events from anything but the current socket are discarded.
    pub fn handle_event(&mut self, event: ConnectionEvent, now: I) -> Vec<ConnectionAction> {
        if let Some(socket) = event.socket()
            && self.socket != Some(socket)
        {
            tracing::debug!(%socket, current = ?self.socket, "discarding stale socket event");
            return vec![];
        }

        match event {
            ConnectionEvent::Tick => self.tick(now),
            ConnectionEvent::Opened { socket } => self.handle_opened(socket),
            ConnectionEvent::Message { socket, text } => match self.phase {
                Phase::Open | Phase::Closing => {
                    vec![ConnectionAction::Display(decode_inbound(&text).to_string())]
                },
                phase => {
                    tracing::debug!(%socket, ?phase, "ignoring message before open");
                    vec![]
                },
            },
            ConnectionEvent::Error { socket, message } => {
                tracing::warn!(%socket, %message, "transport error");
                let reason = CloseReason::classify(CloseCode::ABNORMAL, self.close_requested);
                let mut actions = vec![ConnectionAction::Display(self.config.notices.error.clone())];
                actions.extend(self.finish_close(reason, now));
                actions
            },
            ConnectionEvent::Closed { socket, code } => {
                tracing::info!(%socket, %code, "socket closed");
                let reason = CloseReason::classify(code, self.close_requested);
                self.finish_close(reason, now)
            },
        }
    }

    /// Check the connect timeout and the reconnect schedule.
    fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        match self.phase {
            Phase::Connecting => self.check_connect_timeout(now),
            Phase::Closed => self.check_scheduled_reconnect(now),
            Phase::Idle | Phase::Open | Phase::Closing => vec![],
        }
    }

    fn check_connect_timeout(&mut self, now: I) -> Vec<ConnectionAction> {
        let (Some(timeout), Some(started)) = (self.config.connect_timeout, self.connect_started)
        else {
            return vec![];
        };

        let elapsed = now - started;
        if elapsed <= timeout {
            return vec![];
        }

        let mut actions = Vec::new();
        if let Some(socket) = self.socket {
            tracing::warn!(%socket, ?elapsed, "connect attempt timed out");
            actions.push(ConnectionAction::Close {
                socket,
                code: CloseCode::NORMAL,
                reason: "Connect timeout".to_string(),
            });
        }
        actions.push(ConnectionAction::Display(self.config.notices.timeout.clone()));
        actions.extend(self.finish_close(CloseReason::abnormal(), now));
        actions
    }

    fn check_scheduled_reconnect(&mut self, now: I) -> Vec<ConnectionAction> {
        let (true, Some(delay), Some(closed_at)) =
            (self.pending_reconnect, self.config.auto_reconnect, self.closed_at)
        else {
            return vec![];
        };

        if now - closed_at < delay {
            return vec![];
        }

        let Some(target) = self.target.clone() else {
            self.pending_reconnect = false;
            return vec![];
        };

        tracing::info!(%target, "automatic reconnect");
        self.open_socket(target, now)
    }

    fn handle_opened(&mut self, socket: SocketId) -> Vec<ConnectionAction> {
        match self.phase {
            Phase::Connecting => {},
            phase => {
                // Closing: a disconnect raced the open. Stay closing.
                tracing::debug!(%socket, ?phase, "ignoring open");
                return vec![];
            },
        }

        self.transition(Phase::Open);
        self.connect_started = None;

        let Some(target) = &self.target else {
            return vec![];
        };

        let command = self.config.bootstrap.for_kind(target.kind()).map(str::to_string);
        let envelope = Envelope::new(target.kind(), command.clone(), target.address());

        let mut actions = Vec::new();
        match envelope.encode() {
            Ok(text) => actions.push(ConnectionAction::Send { socket, text }),
            Err(e) => tracing::warn!(%socket, error = %e, "failed to encode bootstrap"),
        }
        if let Some(command) = command {
            actions.push(ConnectionAction::Display(format!("\r\n{command}\r\n")));
        }

        tracing::info!(%socket, kind = %target.kind(), "socket open, bootstrap sent");
        actions
    }

    fn open_socket(&mut self, target: SessionTarget, now: I) -> Vec<ConnectionAction> {
        let socket = SocketId(self.next_generation);
        self.next_generation += 1;

        let url = self.config.url_for(target.kind());
        let banner = self.config.notices.banner_for(target.address());

        tracing::info!(%socket, %url, %target, "connecting");

        self.socket = Some(socket);
        self.close_requested = false;
        self.pending_reconnect = false;
        self.closed_at = None;
        self.connect_started = Some(now);
        self.target = Some(target);
        self.transition(Phase::Connecting);

        vec![ConnectionAction::Display(banner), ConnectionAction::Open { socket, url }]
    }

    fn finish_close(&mut self, reason: CloseReason, now: I) -> Vec<ConnectionAction> {
        self.socket = None;
        self.close_requested = false;
        self.connect_started = None;
        self.transition(Phase::Closed);

        if self.config.auto_reconnect.is_some() && reason.is_unexpected() && self.target.is_some() {
            self.pending_reconnect = true;
            self.closed_at = Some(now);
        }

        vec![
            ConnectionAction::Display(self.config.notices.closed.clone()),
            ConnectionAction::Closed { reason, reconnect_pending: self.pending_reconnect },
        ]
    }

    fn transition(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }
}

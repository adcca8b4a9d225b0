//! Session bridge.
//!
//! The [`SessionBridge`] composes one [`LineEditor`], one
//! [`ConnectionManager`] and the [`SessionTarget`] they serve.
//!
//! # Responsibilities
//!
//! - Connects as soon as it is mounted.
//! - Filters keystrokes through the interception hook, then feeds the editor.
//! - Forwards submitted lines to [`ConnectionManager::send`].
//! - Translates [`ConnectionAction`]s into [`BridgeAction`]s for the driver.
//! - Tracks the loading indicator while a close it requested is in flight.
//! - Tears down exactly once: closes a live socket, then disposes the display.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use termwire_core::{ConnectionAction, ConnectionConfig, ConnectionEvent, ConnectionManager, Phase};
use termwire_proto::{CloseCode, SessionTarget};

use crate::{BridgeAction, EditorConfig, EditorOutput, KeyInput, LineEditor};

/// One remote session bound to one display.
///
/// Generic over the instant type so simulation can drive virtual time.
#[derive(Debug)]
pub struct SessionBridge<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    target: SessionTarget,
    editor: LineEditor,
    connection: ConnectionManager<I>,
    busy: bool,
    disposed: bool,
}

impl<I> SessionBridge<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Mount a bridge for `target` and start connecting.
    ///
    /// Returns the bridge together with the actions of the first connect.
    pub fn mount(
        target: SessionTarget,
        connection_config: ConnectionConfig,
        editor_config: EditorConfig,
        now: I,
    ) -> (Self, Vec<BridgeAction>) {
        let mut bridge = Self {
            target,
            editor: LineEditor::new(editor_config),
            connection: ConnectionManager::new(connection_config),
            busy: false,
            disposed: false,
        };

        tracing::info!(session = %bridge.target, "mounting session bridge");

        let mut actions = match bridge.connection.connect(bridge.target.clone(), now) {
            Ok(actions) => bridge.translate(actions),
            Err(e) => {
                tracing::warn!(error = %e, "initial connect rejected");
                vec![]
            },
        };
        actions.push(BridgeAction::Display(bridge.editor.prompt().to_string()));
        (bridge, actions)
    }

    /// Session target.
    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    /// Current connection phase.
    pub fn phase(&self) -> Phase {
        self.connection.phase()
    }

    /// The connection manager.
    pub fn connection(&self) -> &ConnectionManager<I> {
        &self.connection
    }

    /// The line editor.
    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    /// Whether the loading indicator is showing.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether [`SessionBridge::teardown`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Key-interception hook. Returns `false` for keys that must be
    /// swallowed before the editor or the display sees them.
    pub fn intercept(&self, key: KeyInput) -> bool {
        !key.is_suppressed()
    }

    /// Process one keystroke.
    pub fn handle_key(&mut self, key: KeyInput) -> Vec<BridgeAction> {
        if self.disposed {
            return vec![];
        }
        if !self.intercept(key) {
            tracing::trace!(?key, "key suppressed");
            return vec![];
        }

        let mut actions = Vec::new();
        for output in self.editor.handle_key(key) {
            match output {
                EditorOutput::Echo(text) => actions.push(BridgeAction::Display(text)),
                EditorOutput::Submit(line) => {
                    let sent = self.connection.send(&line);
                    actions.extend(self.translate(sent));
                },
            }
        }
        actions
    }

    /// Process a socket event reported by the transport.
    pub fn handle_socket_event(&mut self, event: ConnectionEvent, now: I) -> Vec<BridgeAction> {
        if self.disposed {
            return vec![];
        }
        let actions = self.connection.handle_event(event, now);
        self.translate(actions)
    }

    /// Drive timeouts and scheduled reconnects.
    pub fn tick(&mut self, now: I) -> Vec<BridgeAction> {
        self.handle_socket_event(ConnectionEvent::Tick, now)
    }

    /// Drop the current socket, if any, and connect again.
    pub fn request_reconnect(&mut self, now: I) -> Vec<BridgeAction> {
        if self.disposed {
            return vec![];
        }
        let actions = self.connection.reconnect(self.target.clone(), now);
        self.translate(actions)
    }

    /// Close the session's socket with `code`.
    ///
    /// Ignored unless the connection is connecting or open. The display stays
    /// up; only the socket closes.
    pub fn request_disconnect(&mut self, code: CloseCode) -> Vec<BridgeAction> {
        if self.disposed {
            return vec![];
        }

        match self.connection.disconnect(code) {
            Ok(actions) => {
                let mut out = self.translate(actions);
                if !self.busy {
                    self.busy = true;
                    out.push(BridgeAction::Busy(true));
                }
                out
            },
            Err(e) => {
                tracing::debug!(error = %e, "disconnect ignored");
                vec![]
            },
        }
    }

    /// Unmount the bridge.
    ///
    /// Closes a connecting or open socket with 1000, then disposes the
    /// display. Runs at most once; later calls return nothing.
    pub fn teardown(&mut self) -> Vec<BridgeAction> {
        if self.disposed {
            return vec![];
        }

        let mut actions = Vec::new();
        if matches!(self.connection.phase(), Phase::Connecting | Phase::Open) {
            match self.connection.disconnect(CloseCode::NORMAL) {
                Ok(closing) => actions.extend(self.translate(closing)),
                Err(e) => tracing::warn!(error = %e, "teardown disconnect failed"),
            }
        }

        tracing::info!(session = %self.target, "session bridge disposed");
        self.disposed = true;
        actions.push(BridgeAction::Dispose);
        actions
    }

    fn translate(&mut self, actions: Vec<ConnectionAction>) -> Vec<BridgeAction> {
        let mut out = Vec::with_capacity(actions.len());

        for action in actions {
            match action {
                ConnectionAction::Display(text) => out.push(BridgeAction::Display(text)),
                ConnectionAction::Open { socket, url } => {
                    // A new socket starts a new line
                    self.editor.clear();
                    if self.busy {
                        self.busy = false;
                        out.push(BridgeAction::Busy(false));
                    }
                    out.push(BridgeAction::Open { socket, url });
                },
                ConnectionAction::Send { socket, text } => {
                    out.push(BridgeAction::Send { socket, text });
                },
                ConnectionAction::Close { socket, code, reason } => {
                    out.push(BridgeAction::Close { socket, code, reason });
                },
                ConnectionAction::Closed { reason, reconnect_pending } => {
                    if self.busy {
                        self.busy = false;
                        out.push(BridgeAction::Busy(false));
                    }
                    out.push(BridgeAction::SessionClosed {
                        reason,
                        awaiting_reconnect: reconnect_pending,
                    });
                },
            }
        }

        out
    }
}

//! Generic runtime for session orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`SessionBridge`]: editor, connection manager and target
//! - [`Driver`]: Platform-specific I/O

use termwire_core::ConnectionConfig;
use termwire_proto::SessionTarget;

use crate::{AppEvent, BridgeAction, Driver, EditorConfig, SessionBridge};

/// Generic runtime that orchestrates one SessionBridge over one Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
pub struct Runtime<D>
where
    D: Driver,
{
    driver: D,
    bridge: SessionBridge<D::Instant>,
    pending: Vec<BridgeAction>,
}

impl<D> Runtime<D>
where
    D: Driver,
{
    /// Mount a session bridge for `target` on `driver`.
    ///
    /// The connect actions are executed when [`Runtime::run`] starts.
    pub fn new(
        driver: D,
        target: SessionTarget,
        connection_config: ConnectionConfig,
        editor_config: EditorConfig,
    ) -> Self {
        let now = driver.now();
        let (bridge, pending) = SessionBridge::mount(target, connection_config, editor_config, now);
        Self { driver, bridge, pending }
    }

    /// Run the main event loop until quit.
    ///
    /// The bridge is torn down on every exit path, including driver errors:
    /// a connecting or open socket is closed and the display is disposed,
    /// then [`Driver::shutdown`] is awaited before this returns.
    ///
    /// # Errors
    ///
    /// Returns the first error the driver reports. A teardown error is only
    /// returned if the loop itself succeeded.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let result = self.event_loop().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "runtime stopped on driver error");
        }

        let teardown = self.bridge.teardown();
        let cleanup = self.execute(teardown);
        self.driver.shutdown().await;
        result.and(cleanup)
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        let initial = std::mem::take(&mut self.pending);
        self.execute(initial)?;

        while let Some(event) = self.driver.poll_event().await? {
            if event == AppEvent::Quit {
                tracing::info!("quit requested");
                break;
            }
            let actions = self.handle(event);
            self.execute(actions)?;
        }

        Ok(())
    }

    /// Route one event to the bridge.
    fn handle(&mut self, event: AppEvent) -> Vec<BridgeAction> {
        let now = self.driver.now();
        match event {
            AppEvent::Key(key) => self.bridge.handle_key(key),
            AppEvent::Socket(event) => self.bridge.handle_socket_event(event, now),
            AppEvent::Tick => self.bridge.tick(now),
            AppEvent::Reconnect => self.bridge.request_reconnect(now),
            AppEvent::Disconnect(code) => self.bridge.request_disconnect(code),
            AppEvent::Quit => vec![],
        }
    }

    /// Execute bridge actions against the driver, in order.
    ///
    /// Socket operations that fail are logged and skipped: the transport
    /// reports the socket's fate through events anyway.
    fn execute(&mut self, actions: Vec<BridgeAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                BridgeAction::Display(text) => self.driver.write(&text)?,
                BridgeAction::Open { socket, url } => {
                    if let Err(e) = self.driver.open(socket, &url) {
                        tracing::warn!(%socket, error = %e, "open failed");
                    }
                },
                BridgeAction::Send { socket, text } => {
                    if let Err(e) = self.driver.send(socket, text) {
                        tracing::warn!(%socket, error = %e, "send failed");
                    }
                },
                BridgeAction::Close { socket, code, reason } => {
                    if let Err(e) = self.driver.close(socket, code, reason) {
                        tracing::warn!(%socket, error = %e, "close failed");
                    }
                },
                BridgeAction::SessionClosed { reason, awaiting_reconnect } => {
                    tracing::info!(code = %reason.code, origin = ?reason.origin, awaiting_reconnect, "session closed");
                    if reason.is_unexpected() && !awaiting_reconnect {
                        self.driver.alert(&reason.describe())?;
                    }
                },
                BridgeAction::Busy(busy) => self.driver.set_busy(busy),
                BridgeAction::Dispose => self.driver.dispose(),
            }
        }
        Ok(())
    }

    /// Get a reference to the bridge
    pub fn bridge(&self) -> &SessionBridge<D::Instant> {
        &self.bridge
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

//! WebSocket transport.
//!
//! Each socket the connection manager opens runs in its own tokio task. The
//! task owns the WebSocket stream and talks to the rest of the program over
//! two channels: commands in (send, close) and [`ConnectionEvent`]s out. Every
//! event is tagged with the [`SocketId`] it was opened under, so the manager
//! can tell a live socket from an abandoned one.
//!
//! This is a thin layer that just moves text - lifecycle logic remains in the
//! Sans-IO [`termwire_core::ConnectionManager`].

use std::{collections::HashMap, time::Duration};

use futures_util::{SinkExt, StreamExt};
use termwire_core::{ConnectionEvent, SocketId};
use termwire_proto::CloseCode;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Message, protocol::CloseFrame},
};

/// Close code reported when the peer sends a close frame without a status.
const NO_STATUS: CloseCode = CloseCode::new(1005);

/// Transport errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No task exists for the socket (never opened, or already finished).
    #[error("unknown socket: {0}")]
    UnknownSocket(SocketId),

    /// The socket task has exited.
    #[error("socket task gone: {0}")]
    TaskGone(SocketId),
}

#[derive(Debug)]
enum SocketCommand {
    Send(String),
    Close { code: CloseCode, reason: String },
}

/// Handle to one socket task.
struct SocketHandle {
    commands: mpsc::UnboundedSender<SocketCommand>,
    task: JoinHandle<()>,
}

/// Owns the socket tasks of one session bridge.
///
/// Events from every socket arrive on the single receiver returned by
/// [`Transport::new`], in the order each task produced them.
pub struct Transport {
    events: mpsc::UnboundedSender<ConnectionEvent>,
    sockets: HashMap<SocketId, SocketHandle>,
}

impl Transport {
    /// Create a transport and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { events, sockets: HashMap::new() }, rx)
    }

    /// Start connecting `socket` to `url`.
    ///
    /// Returns immediately. `Opened` (or `Error` then `Closed`) follows on the
    /// event channel. Must be called from within a tokio runtime.
    pub fn open(&mut self, socket: SocketId, url: &str) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task =
            tokio::spawn(run_socket(socket, url.to_string(), command_rx, self.events.clone()));

        tracing::debug!(%socket, %url, "socket task spawned");

        if let Some(old) = self.sockets.insert(socket, SocketHandle { commands, task }) {
            // Ids are never reused, but don't leak a task if one ever is
            old.task.abort();
        }
    }

    /// Queue one text message on `socket`.
    pub fn send(&mut self, socket: SocketId, text: String) -> Result<(), TransportError> {
        self.command(socket, SocketCommand::Send(text))
    }

    /// Start the closing handshake on `socket`.
    ///
    /// Works on a socket that is still connecting: the attempt is abandoned
    /// and `Closed` is reported with `code`.
    pub fn close(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: String,
    ) -> Result<(), TransportError> {
        self.command(socket, SocketCommand::Close { code, reason })
    }

    /// Forget a socket whose task reported `Closed`.
    pub fn release(&mut self, socket: SocketId) {
        if self.sockets.remove(&socket).is_some() {
            tracing::trace!(%socket, "socket released");
        }
    }

    /// Number of socket tasks still tracked.
    pub fn active(&self) -> usize {
        self.sockets.len()
    }

    /// Abort every socket task.
    ///
    /// Queued commands are lost, including close frames. Prefer
    /// [`Transport::shutdown`] when there is time to wait.
    pub fn stop(&mut self) {
        for (socket, handle) in self.sockets.drain() {
            tracing::debug!(%socket, "aborting socket task");
            handle.task.abort();
        }
    }

    /// Let every socket task finish, aborting those still running after
    /// `grace`.
    ///
    /// Commands already queued are still delivered, so a close requested just
    /// before this call completes its handshake. A socket that is open with
    /// no close queued is closed with 1000. A socket still connecting is
    /// abandoned.
    pub async fn shutdown(&mut self, grace: Duration) {
        let deadline = time::Instant::now() + grace;
        let tasks: Vec<_> = self
            .sockets
            .drain()
            .map(|(socket, handle)| {
                // Closing the command channel tells the task its owner is gone
                drop(handle.commands);
                (socket, handle.task)
            })
            .collect();

        for (socket, mut task) in tasks {
            if time::timeout_at(deadline, &mut task).await.is_err() {
                tracing::warn!(%socket, "socket task outlived shutdown grace, aborting");
                task.abort();
            } else {
                tracing::trace!(%socket, "socket task finished");
            }
        }
    }

    fn command(&mut self, socket: SocketId, command: SocketCommand) -> Result<(), TransportError> {
        let handle = self.sockets.get(&socket).ok_or(TransportError::UnknownSocket(socket))?;
        handle.commands.send(command).map_err(|_| TransportError::TaskGone(socket))
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one socket from connect to close.
async fn run_socket(
    socket: SocketId,
    url: String,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) {
    let report = |event: ConnectionEvent| {
        // Receiver gone means the bridge is shutting down
        let _ = events.send(event);
    };

    let connect = connect_async(url.as_str());
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    tracing::warn!(%socket, %url, error = %e, "connect failed");
                    report(ConnectionEvent::Error { socket, message: e.to_string() });
                    report(ConnectionEvent::Closed { socket, code: CloseCode::ABNORMAL });
                    return;
                },
            },
            command = commands.recv() => match command {
                Some(SocketCommand::Close { code, .. }) => {
                    tracing::debug!(%socket, %code, "closed before open");
                    report(ConnectionEvent::Closed { socket, code });
                    return;
                },
                Some(SocketCommand::Send(_)) => {
                    tracing::debug!(%socket, "dropping send before open");
                },
                None => return,
            },
        }
    };

    report(ConnectionEvent::Opened { socket });

    let (mut sink, mut source) = stream.split();
    let mut close_code: Option<CloseCode> = None;
    let mut close_sent = false;
    let mut commands_open = true;

    loop {
        tokio::select! {
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    report(ConnectionEvent::Message { socket, text });
                },
                Some(Ok(Message::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    report(ConnectionEvent::Message { socket, text });
                },
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map_or(NO_STATUS, |f| CloseCode::new(u16::from(f.code)));
                    tracing::debug!(%socket, %code, "close frame received");
                    close_code = Some(code);
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {},
                Some(Err(e)) => {
                    if close_code.is_some() {
                        // Peer dropped the TCP stream right after its close frame
                        tracing::debug!(%socket, error = %e, "error after close frame");
                        break;
                    }
                    tracing::warn!(%socket, error = %e, "socket error");
                    report(ConnectionEvent::Error { socket, message: e.to_string() });
                    report(ConnectionEvent::Closed { socket, code: CloseCode::ABNORMAL });
                    return;
                },
                None => break,
            },
            command = commands.recv(), if commands_open => match command {
                Some(SocketCommand::Send(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(%socket, error = %e, "send failed");
                    }
                },
                Some(SocketCommand::Close { code, reason }) => {
                    let wire_code = if code.is_sendable() { code } else { CloseCode::NORMAL };
                    let frame = CloseFrame { code: wire_code.as_u16().into(), reason: reason.into() };
                    close_sent = true;
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        tracing::warn!(%socket, error = %e, "close failed");
                        report(ConnectionEvent::Closed { socket, code });
                        return;
                    }
                },
                None => {
                    commands_open = false;
                    if !close_sent && close_code.is_none() {
                        tracing::debug!(%socket, "owner gone, closing");
                        let frame = CloseFrame {
                            code: CloseCode::NORMAL.as_u16().into(),
                            reason: "".into(),
                        };
                        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                            tracing::debug!(%socket, error = %e, "close on shutdown failed");
                            break;
                        }
                    }
                },
            },
        }
    }

    let code = close_code.unwrap_or(CloseCode::ABNORMAL);
    tracing::debug!(%socket, %code, "socket finished");
    report(ConnectionEvent::Closed { socket, code });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_socket_is_rejected() {
        let (mut transport, _events) = Transport::new();
        let socket = SocketId::new(7);

        assert_eq!(transport.send(socket, "x".into()), Err(TransportError::UnknownSocket(socket)));
        assert_eq!(
            transport.close(socket, CloseCode::NORMAL, String::new()),
            Err(TransportError::UnknownSocket(socket))
        );
    }

    #[tokio::test]
    async fn open_failure_reports_error_then_abnormal_close() {
        let (mut transport, mut events) = Transport::new();
        let socket = SocketId::new(1);

        // Nothing listens on port 1
        transport.open(socket, "ws://127.0.0.1:1/log");

        let first = events.recv().await.unwrap();
        assert!(matches!(first, ConnectionEvent::Error { socket: s, .. } if s == socket));

        let second = events.recv().await.unwrap();
        assert_eq!(second, ConnectionEvent::Closed { socket, code: CloseCode::ABNORMAL });
    }

    #[tokio::test]
    async fn release_forgets_socket() {
        let (mut transport, _events) = Transport::new();
        let socket = SocketId::new(1);
        transport.open(socket, "ws://127.0.0.1:1/log");
        assert_eq!(transport.active(), 1);

        transport.release(socket);
        assert_eq!(transport.active(), 0);
    }
}

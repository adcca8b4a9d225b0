//! Property-based tests for the connection lifecycle.
//!
//! Arbitrary interleavings of user operations and transport events must keep
//! the manager inside its state graph:
//! - socket present exactly in `Connecting`, `Open` and `Closing`
//! - every phase change is a legal edge
//! - socket ids never repeat
//! - events from abandoned sockets change nothing
//! - every envelope sent is addressed to the session target

use std::time::{Duration, Instant};

use proptest::prelude::*;
use termwire_core::{
    ConnectionAction, ConnectionConfig, ConnectionEvent, ConnectionManager, Phase, SocketId,
};
use termwire_proto::{CloseCode, Envelope, SessionKind, SessionTarget};

const ADDRESS: &str = "192.168.1.20";

/// Which socket a transport event claims to come from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Current,
    Stale,
}

#[derive(Debug, Clone)]
enum Op {
    Connect,
    Reconnect,
    Disconnect(u16),
    Send(String),
    Opened(Source),
    Message(Source),
    Error(Source),
    Closed(Source, u16),
    Tick(u64),
}

fn close_code() -> impl Strategy<Value = u16> {
    prop_oneof![Just(1000u16), Just(1001), Just(1006), 3000u16..4999]
}

fn source() -> impl Strategy<Value = Source> {
    prop_oneof![3 => Just(Source::Current), 1 => Just(Source::Stale)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Connect),
        2 => Just(Op::Reconnect),
        1 => close_code().prop_map(Op::Disconnect),
        2 => "[a-z \"\\\\]{0,12}".prop_map(Op::Send),
        3 => source().prop_map(Op::Opened),
        2 => source().prop_map(Op::Message),
        1 => source().prop_map(Op::Error),
        2 => (source(), close_code()).prop_map(|(s, c)| Op::Closed(s, c)),
        1 => (0u64..10).prop_map(Op::Tick),
    ]
}

fn kind() -> impl Strategy<Value = SessionKind> {
    prop_oneof![Just(SessionKind::Log), Just(SessionKind::Process), Just(SessionKind::Generic)]
}

fn config() -> impl Strategy<Value = ConnectionConfig> {
    (prop::option::of(1u64..5), prop::option::of(1u64..5)).prop_map(|(timeout, reconnect)| {
        let mut config = ConnectionConfig::default();
        config.connect_timeout = timeout.map(Duration::from_secs);
        config.auto_reconnect = reconnect.map(Duration::from_secs);
        config
    })
}

/// Socket id for an event. Stale ids are ones handed out earlier (or never).
fn resolve(source: Source, current: Option<SocketId>, highest: u64) -> SocketId {
    match (source, current) {
        (Source::Current, Some(socket)) => socket,
        (Source::Current, None) | (Source::Stale, _) => {
            let stale = current.map_or(highest + 1, |s| s.generation().saturating_sub(1));
            SocketId::new(stale)
        },
    }
}

fn apply(
    conn: &mut ConnectionManager,
    target: &SessionTarget,
    op: &Op,
    now: Instant,
    highest: u64,
) -> Vec<ConnectionAction> {
    let current = conn.socket();
    match op {
        Op::Connect => conn.connect(target.clone(), now).unwrap_or_default(),
        Op::Reconnect => conn.reconnect(target.clone(), now),
        Op::Disconnect(code) => conn.disconnect(CloseCode::new(*code)).unwrap_or_default(),
        Op::Send(line) => conn.send(line),
        Op::Opened(s) => conn
            .handle_event(ConnectionEvent::Opened { socket: resolve(*s, current, highest) }, now),
        Op::Message(s) => conn.handle_event(
            ConnectionEvent::Message { socket: resolve(*s, current, highest), text: "out".into() },
            now,
        ),
        Op::Error(s) => conn.handle_event(
            ConnectionEvent::Error { socket: resolve(*s, current, highest), message: "x".into() },
            now,
        ),
        Op::Closed(s, code) => conn.handle_event(
            ConnectionEvent::Closed {
                socket: resolve(*s, current, highest),
                code: CloseCode::new(*code),
            },
            now,
        ),
        Op::Tick(_) => conn.handle_event(ConnectionEvent::Tick, now),
    }
}

proptest! {
    #[test]
    fn prop_lifecycle_stays_in_graph(
        kind in kind(),
        config in config(),
        ops in prop::collection::vec(op(), 0..60),
    ) {
        let target = SessionTarget::new(ADDRESS, kind);
        let mut conn = ConnectionManager::new(config);
        let mut now = Instant::now();
        let mut highest = 0u64;

        for op in &ops {
            if let Op::Tick(secs) = op {
                now += Duration::from_secs(*secs);
            }

            let before = conn.phase();
            let before_socket = conn.socket();
            let actions = apply(&mut conn, &target, op, now, highest);
            let after = conn.phase();

            prop_assert!(
                before == after || before.can_transition_to(after)
                    // A reconnect passes through Closed within one call
                    || (matches!(op, Op::Reconnect) && after == Phase::Connecting),
                "illegal edge {:?} -> {:?} on {:?}", before, after, op
            );
            prop_assert_eq!(conn.socket().is_some(), after.has_socket());

            for action in &actions {
                match action {
                    ConnectionAction::Open { socket, url } => {
                        prop_assert!(socket.generation() > highest, "socket id reused");
                        highest = socket.generation();
                        prop_assert!(url.ends_with(kind.endpoint_segment()));
                    },
                    ConnectionAction::Send { socket, text } => {
                        prop_assert_eq!(Some(*socket), conn.socket());
                        let envelope = Envelope::decode(text).unwrap();
                        prop_assert_eq!(envelope.target(), ADDRESS);
                        prop_assert_eq!(envelope.kind(), kind);
                    },
                    _ => {},
                }
            }

            if let Op::Send(_) = op {
                prop_assert_eq!(actions.is_empty(), before != Phase::Open);
            }

            let stale = match op {
                Op::Opened(Source::Stale)
                | Op::Message(Source::Stale)
                | Op::Error(Source::Stale)
                | Op::Closed(Source::Stale, _) => true,
                Op::Opened(Source::Current)
                | Op::Message(Source::Current)
                | Op::Error(Source::Current)
                | Op::Closed(Source::Current, _) => before_socket.is_none(),
                _ => false,
            };
            if stale {
                prop_assert!(actions.is_empty(), "stale event produced {:?}", actions);
                prop_assert_eq!(before, after);
                prop_assert_eq!(before_socket, conn.socket());
            }
        }
    }

    #[test]
    fn prop_reconnect_while_connecting_is_noop(kind in kind(), repeats in 1usize..5) {
        let target = SessionTarget::new(ADDRESS, kind);
        let mut conn = ConnectionManager::new(ConnectionConfig::default());
        let now = Instant::now();
        conn.connect(target.clone(), now).unwrap();
        let socket = conn.socket();

        for _ in 0..repeats {
            prop_assert!(conn.reconnect(target.clone(), now).is_empty());
        }
        prop_assert_eq!(conn.socket(), socket);
        prop_assert_eq!(conn.phase(), Phase::Connecting);
    }

    #[test]
    fn prop_any_code_closes(code in close_code()) {
        let target = SessionTarget::new(ADDRESS, SessionKind::Process);
        let mut conn = ConnectionManager::new(ConnectionConfig::default());
        let now = Instant::now();
        conn.connect(target, now).unwrap();
        let socket = conn.socket().unwrap();
        conn.handle_event(ConnectionEvent::Opened { socket }, now);

        let actions = conn.handle_event(
            ConnectionEvent::Closed { socket, code: CloseCode::new(code) },
            now,
        );
        prop_assert_eq!(conn.phase(), Phase::Closed);
        let reported = actions.iter().any(|a| matches!(
            a,
            ConnectionAction::Closed { reason, .. } if reason.code.as_u16() == code
        ));
        prop_assert!(reported);
    }
}

//! Property-based tests for the session bridge.
//!
//! Tests verify that invariants hold under arbitrary interleavings of
//! keystrokes, owner requests and transport events. This ensures behavioral
//! correctness across all possible execution paths.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use termwire_app::{BridgeAction, EditorConfig, KeyInput, SessionBridge};
use termwire_core::{ConnectionConfig, ConnectionEvent, SocketId};
use termwire_harness::{InvariantRegistry, SessionSnapshot};
use termwire_proto::{CloseCode, SessionKind, SessionTarget};

#[derive(Debug, Clone)]
enum Step {
    Key(KeyInput),
    Reconnect,
    Disconnect(u16),
    /// Transport event for the current socket (or an old one if `stale`).
    Opened { stale: bool },
    Message { stale: bool },
    Closed { stale: bool, code: u16 },
    Error { stale: bool },
    Tick(u64),
    Teardown,
}

fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        4 => prop::char::range(' ', '~').prop_map(KeyInput::Char),
        1 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Up),
        1 => Just(KeyInput::Down),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => key_strategy().prop_map(Step::Key),
        1 => Just(Step::Reconnect),
        1 => prop_oneof![Just(1000u16), Just(1001), Just(4000)].prop_map(Step::Disconnect),
        2 => any::<bool>().prop_map(|stale| Step::Opened { stale }),
        1 => any::<bool>().prop_map(|stale| Step::Message { stale }),
        2 => (any::<bool>(), prop_oneof![Just(1000u16), Just(1001), Just(1006)])
            .prop_map(|(stale, code)| Step::Closed { stale, code }),
        1 => any::<bool>().prop_map(|stale| Step::Error { stale }),
        1 => (0u64..6).prop_map(Step::Tick),
        1 => Just(Step::Teardown),
    ]
}

/// Socket an event claims to come from.
fn source(bridge: &SessionBridge, stale: bool, highest: u64) -> SocketId {
    match bridge.connection().socket() {
        Some(current) if !stale => current,
        Some(current) => SocketId::new(current.generation().saturating_sub(1)),
        None => SocketId::new(highest),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Bridge invariants hold after every step.
    #[test]
    fn prop_bridge_invariants_hold(
        auto_reconnect in any::<bool>(),
        steps in prop::collection::vec(step_strategy(), 0..60),
    ) {
        let mut config = ConnectionConfig::default().connect_timeout(Duration::from_secs(8));
        if auto_reconnect {
            config = config.auto_reconnect(Duration::from_secs(2));
        }

        let mut now = Instant::now();
        let (mut bridge, _) = SessionBridge::mount(
            SessionTarget::new("10.1.2.3", SessionKind::Generic),
            config,
            EditorConfig::default(),
            now,
        );
        let invariants = InvariantRegistry::standard();
        let mut highest = 1u64;
        let mut disposed_seen = false;

        for step in steps {
            let actions = match &step {
                Step::Key(key) => bridge.handle_key(*key),
                Step::Reconnect => bridge.request_reconnect(now),
                Step::Disconnect(code) => bridge.request_disconnect(CloseCode::new(*code)),
                Step::Opened { stale } => {
                    let socket = source(&bridge, *stale, highest);
                    bridge.handle_socket_event(ConnectionEvent::Opened { socket }, now)
                },
                Step::Message { stale } => {
                    let socket = source(&bridge, *stale, highest);
                    bridge.handle_socket_event(
                        ConnectionEvent::Message { socket, text: "data".into() },
                        now,
                    )
                },
                Step::Closed { stale, code } => {
                    let socket = source(&bridge, *stale, highest);
                    bridge.handle_socket_event(
                        ConnectionEvent::Closed { socket, code: CloseCode::new(*code) },
                        now,
                    )
                },
                Step::Error { stale } => {
                    let socket = source(&bridge, *stale, highest);
                    bridge.handle_socket_event(
                        ConnectionEvent::Error { socket, message: "reset".into() },
                        now,
                    )
                },
                Step::Tick(secs) => {
                    now += Duration::from_secs(*secs);
                    bridge.tick(now)
                },
                Step::Teardown => bridge.teardown(),
            };

            for action in &actions {
                if let BridgeAction::Open { socket, .. } = action {
                    prop_assert!(socket.generation() > highest, "socket id reused");
                    highest = socket.generation();
                }
            }

            let dispose_count = actions.iter().filter(|a| **a == BridgeAction::Dispose).count();
            if disposed_seen {
                prop_assert!(actions.is_empty(), "actions after dispose: {:?}", actions);
            }
            prop_assert!(dispose_count <= 1);
            if dispose_count == 1 {
                prop_assert_eq!(actions.last(), Some(&BridgeAction::Dispose));
                disposed_seen = true;
            }

            let snapshot = SessionSnapshot::from_bridge(&bridge);
            prop_assert!(
                invariants.check_all(&snapshot).is_ok(),
                "Invariant violated after {:?}: {:?}", step, snapshot
            );
        }
    }
}

//! Property-based tests for the line editor and the session bridge.
//!
//! The editor is checked against a plain `Vec<char>` model: whatever keys
//! arrive, its buffer and its submitted lines must match the model.

use std::time::Instant;

use proptest::prelude::*;
use termwire_app::{BridgeAction, EditorConfig, EditorOutput, KeyInput, LineEditor, SessionBridge};
use termwire_core::{ConnectionConfig, ConnectionEvent};
use termwire_proto::{Envelope, SessionKind, SessionTarget};

/// Generate random printable characters, including wide ones.
fn printable_char() -> impl Strategy<Value = char> {
    prop_oneof![
        8 => prop::char::range(' ', '~'),
        1 => Just('é'),
        1 => Just('日'),
    ]
}

/// Generate random key inputs.
fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        6 => printable_char().prop_map(KeyInput::Char),
        2 => Just(KeyInput::Enter),
        2 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Tab),
        1 => Just(KeyInput::Esc),
        1 => Just(KeyInput::Left),
        1 => Just(KeyInput::Right),
        1 => Just(KeyInput::Up),
        1 => Just(KeyInput::Down),
        1 => Just(KeyInput::Delete),
    ]
}

proptest! {
    /// Editor buffer follows the model under arbitrary key sequences.
    #[test]
    fn prop_editor_matches_model(keys in prop::collection::vec(key_strategy(), 0..80)) {
        let mut editor = LineEditor::new(EditorConfig::default());
        let mut model: Vec<char> = Vec::new();
        let mut expected_submits = Vec::new();
        let mut submits = Vec::new();

        for key in keys {
            let out = editor.handle_key(key);
            match key {
                KeyInput::Char(c) => model.push(c),
                KeyInput::Backspace => { model.pop(); },
                KeyInput::Enter if !model.is_empty() => {
                    expected_submits.push(model.iter().collect::<String>());
                    model.clear();
                },
                _ => {},
            }

            for o in out {
                if let EditorOutput::Submit(line) = o {
                    submits.push(line);
                }
            }
            let model_line: String = model.iter().collect();
            prop_assert_eq!(editor.buffer(), model_line.as_str());
        }

        prop_assert_eq!(submits, expected_submits);
    }

    /// Backspace never emits more erasure than what was typed.
    #[test]
    fn prop_backspace_never_erases_prompt(
        typed in prop::collection::vec(printable_char(), 0..10),
        backspaces in 0usize..20,
    ) {
        let mut editor = LineEditor::new(EditorConfig::default());
        let mut typed_columns = 0usize;
        for c in &typed {
            editor.handle_key(KeyInput::Char(*c));
            typed_columns += if *c == '日' { 2 } else { 1 };
        }

        let mut erased_columns = 0usize;
        for _ in 0..backspaces {
            for out in editor.handle_key(KeyInput::Backspace) {
                if let EditorOutput::Echo(text) = out {
                    erased_columns += text.matches("\x08 \x08").count();
                }
            }
        }

        prop_assert!(erased_columns <= typed_columns);
        if backspaces >= typed.len() {
            prop_assert!(editor.is_empty());
            prop_assert_eq!(erased_columns, typed_columns);
        }
    }

    /// Every line sent through an open bridge arrives as one envelope with
    /// the exact text typed.
    #[test]
    fn prop_bridge_sends_typed_lines(
        lines in prop::collection::vec("[ -~]{1,20}", 1..5),
        kind in prop_oneof![Just(SessionKind::Log), Just(SessionKind::Process), Just(SessionKind::Generic)],
    ) {
        let now = Instant::now();
        let (mut bridge, _) = SessionBridge::mount(
            SessionTarget::new("172.16.0.9", kind),
            ConnectionConfig::default(),
            EditorConfig::default(),
            now,
        );
        let socket = bridge.connection().socket().unwrap();
        bridge.handle_socket_event(ConnectionEvent::Opened { socket }, now);

        for line in &lines {
            let mut actions = Vec::new();
            for c in line.chars() {
                actions.extend(bridge.handle_key(KeyInput::Char(c)));
            }
            actions.extend(bridge.handle_key(KeyInput::Enter));

            let sent: Vec<_> = actions
                .iter()
                .filter_map(|a| match a {
                    BridgeAction::Send { text, .. } => Some(Envelope::decode(text).unwrap()),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(sent.len(), 1);
            prop_assert_eq!(sent[0].data(), Some(line.as_str()));
            prop_assert_eq!(sent[0].target(), "172.16.0.9");
            prop_assert_eq!(sent[0].kind(), kind);
        }
    }
}

//! JSON message envelope.
//!
//! Every outbound request is one WebSocket text message holding a JSON object
//! with exactly three keys:
//!
//! ```text
//! {"type":"LOG","data":"tail -f /var/log/syslog","target":"10.0.0.5"}
//! ```
//!
//! There is no length prefix; the transport delivers one envelope per message.
//! Inbound data is not enveloped at all: the service streams raw terminal text
//! which is written to the display as-is.
//!
//! # Invariants
//!
//! - Encoding is deterministic: keys are always emitted in `type`, `data`,
//!   `target` order with no insignificant whitespace.
//! - `decode(encode(e)) == e` for every envelope, including payloads with
//!   quotes, backslashes, control characters and non-ASCII text.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ProtocolError, Result},
    session::{SessionKind, SessionTarget},
};

/// Outbound request unit.
///
/// Immutable: a fresh envelope is built for every send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: SessionKind,
    data: Option<String>,
    target: String,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(kind: SessionKind, data: Option<String>, target: impl Into<String>) -> Self {
        Self { kind, data, target: target.into() }
    }

    /// Envelope carrying a submitted input line for `target`.
    pub fn command(target: &SessionTarget, line: impl Into<String>) -> Self {
        Self::new(target.kind(), Some(line.into()), target.address())
    }

    /// Session kind tag (`type` on the wire).
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Payload (`data` on the wire). `None` encodes as `null`.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Remote address (`target` on the wire).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Serialize to wire text.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse wire text back into an envelope.
    ///
    /// Only outbound traffic is enveloped, so this is used to inspect what was
    /// sent rather than to read server output.
    pub fn decode(wire: &str) -> Result<Self> {
        serde_json::from_str(wire).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Encode `line` for `kind` addressed to `target` in one step.
pub fn encode_line(kind: SessionKind, line: &str, target: &str) -> Result<String> {
    Envelope::new(kind, Some(line.to_string()), target).encode()
}

/// Inbound passthrough. Server output is raw text, never re-parsed.
pub fn decode_inbound(text: &str) -> &str {
    text
}

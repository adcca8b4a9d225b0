//! WebSocket close-code taxonomy.
//!
//! Only three codes get special meaning: 1000 (normal), 1001 (server going
//! away) and 1006 (abnormal closure, never sent on the wire but reported
//! locally when the transport drops). Every other code is passed through
//! untouched.
//!
//! All closes drive the connection to `Closed`; the [`CloseOrigin`] decides
//! how the shell presents them.

use std::fmt;

/// WebSocket close status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloseCode(u16);

impl CloseCode {
    /// Normal closure, user- or app-initiated.
    pub const NORMAL: CloseCode = CloseCode(1000);
    /// Server is going away.
    pub const GOING_AWAY: CloseCode = CloseCode(1001);
    /// Connection dropped without a close frame.
    pub const ABNORMAL: CloseCode = CloseCode(1006);

    /// Codes with defined handling.
    pub const RECOGNIZED: [CloseCode; 3] = [Self::NORMAL, Self::GOING_AWAY, Self::ABNORMAL];

    /// Wrap a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Raw numeric code.
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// True for 1000, 1001 and 1006.
    pub fn is_recognized(self) -> bool {
        Self::RECOGNIZED.contains(&self)
    }

    /// True if this code may appear in a close frame on the wire.
    ///
    /// 1006 is reserved for local reporting and must not be sent.
    pub fn is_sendable(self) -> bool {
        self != Self::ABNORMAL
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side ended the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseOrigin {
    /// The local user or application asked for the close.
    User,
    /// The server closed the socket.
    Server,
    /// The transport failed (network error, open failure, timeout).
    Abnormal,
}

/// Why a socket reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseReason {
    /// Close code reported by the transport.
    pub code: CloseCode,
    /// Who initiated it.
    pub origin: CloseOrigin,
}

impl CloseReason {
    /// Create a close reason.
    pub const fn new(code: CloseCode, origin: CloseOrigin) -> Self {
        Self { code, origin }
    }

    /// Transport failure without a close frame.
    pub const fn abnormal() -> Self {
        Self::new(CloseCode::ABNORMAL, CloseOrigin::Abnormal)
    }

    /// Classify a close reported by the transport.
    ///
    /// A close the user requested stays [`CloseOrigin::User`] whatever code
    /// comes back. Otherwise 1006 is abnormal and anything else came from
    /// the server.
    pub fn classify(code: CloseCode, requested_locally: bool) -> Self {
        let origin = if requested_locally {
            CloseOrigin::User
        } else if code == CloseCode::ABNORMAL {
            CloseOrigin::Abnormal
        } else {
            CloseOrigin::Server
        };
        Self::new(code, origin)
    }

    /// Whether the shell should tell the user about this close.
    pub fn is_unexpected(&self) -> bool {
        self.origin != CloseOrigin::User
    }

    /// Short human description for alerts.
    pub fn describe(&self) -> String {
        match (self.origin, self.code) {
            (CloseOrigin::User, _) => "connection closed".to_string(),
            (CloseOrigin::Server, CloseCode::GOING_AWAY) => "server is going away".to_string(),
            (CloseOrigin::Server, code) => format!("server closed the connection ({code})"),
            (CloseOrigin::Abnormal, _) => "connection lost".to_string(),
        }
    }
}

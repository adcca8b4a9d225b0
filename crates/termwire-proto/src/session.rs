//! Session targets.
//!
//! A [`SessionTarget`] names the remote host a bridge talks to and the kind of
//! session it runs there. It is created by the shell once the address has
//! passed validation and is never mutated afterwards.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Kind of remote session.
///
/// Serializes as the upper-case tag carried in the envelope `type` field and
/// selects the service path the socket connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    /// Streaming log tail.
    Log,
    /// Remote process manager.
    Process,
    /// Free-form command session.
    Generic,
}

impl SessionKind {
    /// All session kinds, in declaration order.
    pub const ALL: [SessionKind; 3] = [SessionKind::Log, SessionKind::Process, SessionKind::Generic];

    /// Envelope `type` tag.
    pub fn tag(self) -> &'static str {
        match self {
            SessionKind::Log => "LOG",
            SessionKind::Process => "PROCESS",
            SessionKind::Generic => "GENERIC",
        }
    }

    /// Path segment of the local service endpoint serving this kind.
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            SessionKind::Log => "log",
            SessionKind::Process => "process",
            SessionKind::Generic => "generic",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint_segment())
    }
}

impl FromStr for SessionKind {
    type Err = ProtocolError;

    /// Accepts either the tag (`LOG`) or the endpoint segment (`log`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(s) || kind.endpoint_segment() == s)
            .ok_or_else(|| ProtocolError::UnknownKind(s.to_string()))
    }
}

/// Validated remote address plus the session kind to run against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTarget {
    address: String,
    kind: SessionKind,
}

impl SessionTarget {
    /// Create a target. The address is assumed to be pre-validated.
    pub fn new(address: impl Into<String>, kind: SessionKind) -> Self {
        Self { address: address.into(), kind }
    }

    /// Remote address carried in every envelope's `target` field.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Session kind.
    pub fn kind(&self) -> SessionKind {
        self.kind
    }
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.address)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn kind_parses_tag_and_segment() {
        assert_eq!("LOG".parse::<SessionKind>(), Ok(SessionKind::Log));
        assert_eq!("process".parse::<SessionKind>(), Ok(SessionKind::Process));
        assert_eq!("Generic".parse::<SessionKind>(), Ok(SessionKind::Generic));
        assert!(matches!("shell".parse::<SessionKind>(), Err(ProtocolError::UnknownKind(_))));
    }

    #[test]
    fn segments_are_distinct() {
        let segments: HashSet<_> = SessionKind::ALL.iter().map(|k| k.endpoint_segment()).collect();
        assert_eq!(segments.len(), SessionKind::ALL.len());

        let tags: HashSet<_> = SessionKind::ALL.iter().map(|k| k.tag()).collect();
        assert_eq!(tags.len(), SessionKind::ALL.len());
    }

    #[test]
    fn target_display() {
        let target = SessionTarget::new("10.0.0.5", SessionKind::Log);
        assert_eq!(target.to_string(), "log@10.0.0.5");
    }
}

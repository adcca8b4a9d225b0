//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The invariant system extracts observable state from a
//! [`termwire_app::SessionBridge`] into a [`SessionSnapshot`], then runs
//! registered [`Invariant`] checks against it. Violations trigger panics with
//! detailed context for debugging.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SessionSnapshot::from_bridge(&bridge);
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{BusyOnlyWhileClosing, ReconnectOnlyWhenClosed, SocketMatchesPhase};
pub use snapshot::SessionSnapshot;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Identifies which invariant was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// A socket exists exactly while connecting, open or closing.
    SocketMatchesPhase,
    /// The loading indicator only shows while a requested close runs.
    BusyOnlyWhileClosing,
    /// An automatic reconnect is only scheduled from `Closed`.
    ReconnectOnlyWhenClosed,
}

impl std::fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SocketMatchesPhase => "SocketMatchesPhase",
            Self::BusyOnlyWhileClosing => "BusyOnlyWhileClosing",
            Self::ReconnectOnlyWhenClosed => "ReconnectOnlyWhenClosed",
        };
        f.write_str(name)
    }
}

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which invariant was violated.
    pub invariant: InvariantKind,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against session state.
///
/// Invariants are behavioral properties that must always hold.
/// They capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Which invariant this is.
    fn kind(&self) -> InvariantKind;

    /// Check the invariant against the current state.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Collects multiple invariants and runs them all against session state.
/// Use [`InvariantRegistry::standard()`] for the bridge invariants.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard bridge invariants.
    ///
    /// Includes:
    /// - [`SocketMatchesPhase`]: socket present iff the phase has one
    /// - [`BusyOnlyWhileClosing`]: loading indicator implies `Closing`
    /// - [`ReconnectOnlyWhenClosed`]: scheduled reconnect implies `Closed`
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SocketMatchesPhase);
        registry.add(BusyOnlyWhileClosing);
        registry.add(ReconnectOnlyWhenClosed);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on first violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic, reason = "test assertion helper")]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use termwire_core::{Phase, SocketId};

    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn idle_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&SessionSnapshot::idle()).is_ok());
    }

    #[test]
    fn socket_without_phase_is_violation() {
        let snapshot =
            SessionSnapshot { socket: Some(SocketId::new(1)), ..SessionSnapshot::idle() };

        let violations = InvariantRegistry::standard().check_all(&snapshot).unwrap_err();
        assert!(violations.iter().any(|v| v.invariant == InvariantKind::SocketMatchesPhase));
    }

    #[test]
    fn busy_while_open_is_violation() {
        let snapshot = SessionSnapshot {
            phase: Phase::Open,
            socket: Some(SocketId::new(1)),
            busy: true,
            ..SessionSnapshot::idle()
        };

        let violations = InvariantRegistry::standard().check_all(&snapshot).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].invariant, InvariantKind::BusyOnlyWhileClosing);
    }
}

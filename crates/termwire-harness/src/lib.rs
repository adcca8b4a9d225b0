//! Deterministic simulation harness for termwire session testing.
//!
//! [`SimDriver`] implements [`termwire_app::Driver`] over a scripted event
//! queue and a virtual clock, so the production [`termwire_app::Runtime`] runs
//! unchanged in tests and every socket operation it performs is recorded.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the bridge
//! invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;

pub use invariants::{
    BusyOnlyWhileClosing, Invariant, InvariantKind, InvariantRegistry, InvariantResult,
    ReconnectOnlyWhenClosed, SessionSnapshot, SocketMatchesPhase, Violation,
};
pub use sim_driver::{RecordedClose, SimDriver, SimDriverError};

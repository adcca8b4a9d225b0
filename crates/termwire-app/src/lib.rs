//! Application layer for termwire
//!
//! Pure state machines and generic runtime for one remote session, enabling
//! deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`LineEditor`]: line-buffered input (echo, erase, submit)
//! - [`SessionBridge`]: composes editor, connection manager and target
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod bridge;
mod driver;
mod editor;
mod event;
mod input;
mod runtime;

pub use action::BridgeAction;
pub use bridge::SessionBridge;
pub use driver::Driver;
pub use editor::{EditorConfig, EditorOutput, LineEditor};
pub use event::AppEvent;
pub use input::KeyInput;
pub use runtime::Runtime;

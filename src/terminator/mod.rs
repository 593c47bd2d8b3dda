//! # Termination primitives.
//!
//! - [`Terminator`] - the `Running → Terminating → Terminated` state machine
//!   with ordered callbacks and first-error-wins recording.
//! - [`Shutter`] - the surface a supervised component exposes (a name and a
//!   terminator), with the terminator operations provided on top.

mod shutter;
mod terminator;

pub use shutter::Shutter;
pub use terminator::{Callback, Phase, Terminator};

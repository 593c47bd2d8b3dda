//! # Process exit funnel.
//!
//! - [`ExitHandlers`] - ordered, named exit hooks run before the process ends
//! - [`QUIT_CODE`] - status used by the fatal assertion helpers

mod assertions;
mod handlers;

pub use assertions::QUIT_CODE;
pub use handlers::{ExitHandlers, ExitHook};

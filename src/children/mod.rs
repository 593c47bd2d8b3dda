//! # Child abstractions.
//!
//! - [`Child`] - a [`Shutter`](crate::Shutter) that exposes a run shape
//! - [`Runnable`] - the four run shapes as a tagged union
//! - [`ChildFn`] - closure-backed child owning its own terminator

mod child;
mod child_fn;

pub use child::{Child, Runnable};
pub use child_fn::ChildFn;

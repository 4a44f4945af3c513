//! Adapter utilities over `datagrid-virtual`.
//!
//! - [`ScrollController`]: one scrollable grid body with at most one active motion
//! - [`Tween`]: adapter-driven smooth scrolling and timed row animations
//! - [`Momentum`]: velocity-based touch momentum with per-frame decay
//! - [`RowAnchor`]: keeps the viewport pinned to a row identity across data replacement
//!
//! Everything is driven by caller-supplied timestamps; nothing here spawns timers.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod controller;
mod momentum;
mod tween;

#[cfg(test)]
mod tests;

pub use anchor::{RowAnchor, apply_anchor, capture_anchor_at, capture_first_visible_anchor};
pub use controller::ScrollController;
pub use momentum::{Momentum, MomentumConfig, TouchTracker};
pub use tween::{Easing, Tween};

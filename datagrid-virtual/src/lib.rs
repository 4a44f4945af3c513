//! Variable-height row virtualization for the `datagrid` engine.
//!
//! The crate owns the math needed to keep a grid body at interactive frame rates regardless of
//! row count: a Fenwick index over row heights, fast offset → row lookup, an overscanned window,
//! keyed height measurements that survive data replacement, scroll compensation for rows that
//! change height above the viewport, and a pool of render surfaces reused by row identity.
//!
//! It is UI-agnostic. The host provides viewport geometry, scroll offsets and measured heights.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod key;
mod offsets;
mod options;
mod pool;
mod rows;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use key::RowKey;
pub use options::{CompensateCallback, OnChangeCallback, VirtualRowsOptions};
pub use pool::{ReconcileStats, Surface, SurfaceId, SurfacePool};
pub use rows::VirtualRows;
pub use state::{FrameState, ScrollState, ViewportState};
pub use types::{Align, RowRange, ScrollDirection, ViewportRect, VirtualWindow, WindowRow};

/// Key type used when rows are identified by their index.
pub type IndexKey = u64;

//! A headless data-grid engine.
//!
//! The grid owns three cooperating layers:
//!
//! - a two-layer configuration model: an immutable original config merged from every source and
//!   an owned effective config receiving runtime mutations ([`ConfigManager`])
//! - a plugin layer with dependency-checked attach/detach, an event bus and a synchronous query
//!   protocol ([`Plugin`], [`GridRef`])
//! - variable-height row virtualization with pooled render surfaces, driven by
//!   [`datagrid_virtual`] and [`datagrid_scroll`]
//!
//! The host feeds rows, configuration, viewport geometry and timestamps, calls
//! [`Grid::frame`] from its animation-frame callback, and positions its own visual units from
//! [`Grid::surfaces`].
#![forbid(unsafe_code)]

mod column;
mod config;
mod debounce;
mod error;
mod grid;
mod options;
mod plugin;
mod render;
mod row;
mod scheduler;
mod template;

#[cfg(test)]
mod tests;

pub use column::{
    CellEditor, CellRenderer, ColumnConfig, ColumnSort, EditOn, FitMode, SortDirection,
};
pub use config::{
    AnimationConfig, AnimationMode, ColumnState, ColumnsSource, ConfigManager, GridConfig,
    GridState, HeaderContent, ShellConfig, SortModel, ToolPanel, ToolbarButton,
};
pub use debounce::Debouncer;
pub use error::{GridError, HookError, HookResult, PluginError, Result};
pub use grid::{FrameReport, Grid, RowAnimation, RowAnimationKind};
pub use options::{GridOptions, HostEventCallback};
pub use plugin::{
    Dependency, FeatureRegistry, GridRef, KeyEvent, Plugin, PluginEvent, PluginFactory,
    PluginManager, PluginManifest, PluginQuery,
};
pub use render::{CellRenderContext, RenderedCell, RowContent, cell_text};
pub use row::{GridRow, IdentityFn, RowId};
pub use scheduler::{RenderPhase, RenderScheduler};
pub use template::CellTemplate;

pub use datagrid_scroll::{Easing, MomentumConfig};
pub use datagrid_virtual::{Align, ReconcileStats, RowRange, Surface, SurfaceId, ViewportRect};

/// A pooled render surface holding one row's rendered cells.
pub type RowSurface = Surface<RowId, RowContent>;

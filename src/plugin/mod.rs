mod bus;
mod context;
mod manager;
mod manifest;
mod registry;

pub(crate) use bus::EventBus;
pub use context::GridRef;
pub use manager::PluginManager;
pub use manifest::{Dependency, PluginManifest};
pub use registry::{FeatureRegistry, PluginFactory};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CellRenderContext, ColumnConfig, ColumnState, HookResult};

/// An event delivered through the plugin bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub detail: Value,
    /// Emitting plugin; `None` for events raised by the grid or the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl PluginEvent {
    pub fn new(kind: impl Into<String>, detail: Value) -> Self {
        Self {
            kind: kind.into(),
            detail,
            source: None,
        }
    }
}

/// A synchronous request answered by every plugin that has an answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginQuery {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub context: Value,
}

impl PluginQuery {
    pub fn new(kind: impl Into<String>, context: Value) -> Self {
        Self {
            kind: kind.into(),
            context,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// A feature module attached to one grid.
///
/// Every hook has a no-op default; a plugin implements the subset it needs. Hooks run one at a
/// time and a panicking hook is isolated: the panic is logged and the grid carries on.
pub trait Plugin<R> {
    /// Called once, when the plugin is attached.
    fn manifest(&self) -> PluginManifest;

    /// Subscribe to events and set up state. Every required dependency is attached already.
    fn attach(&mut self, grid: &mut GridRef<'_, R>) {
        let _ = grid;
    }

    fn detach(&mut self, grid: &mut GridRef<'_, R>) {
        let _ = grid;
    }

    fn on_event(&mut self, grid: &mut GridRef<'_, R>, event: &PluginEvent) -> HookResult {
        let _ = (grid, event);
        Ok(())
    }

    /// Return `true` to mark the key handled and stop propagation.
    fn on_key_down(&mut self, grid: &mut GridRef<'_, R>, event: &KeyEvent) -> bool {
        let _ = (grid, event);
        false
    }

    /// Transforms the display row list (filtering, sorting, grouping).
    fn process_rows(&mut self, grid: &mut GridRef<'_, R>, rows: Vec<Arc<R>>) -> Vec<Arc<R>> {
        let _ = grid;
        rows
    }

    fn after_cell_render(&mut self, ctx: &mut CellRenderContext<'_, R>) {
        let _ = ctx;
    }

    fn after_render(&mut self, grid: &mut GridRef<'_, R>) {
        let _ = grid;
    }

    /// Answers queries whose type is listed in the manifest.
    ///
    /// Only query types declared with [`PluginManifest::answers`] reach this method. Any other
    /// query goes to [`handle_query`](Self::handle_query), so an override here stays silent for
    /// a type the manifest omits.
    fn resolve_query(&mut self, grid: &mut GridRef<'_, R>, query: &PluginQuery) -> Option<Value> {
        let _ = (grid, query);
        None
    }

    /// Fallback for queries the manifest does not list.
    fn handle_query(&mut self, query: &PluginQuery) -> Option<Value> {
        let _ = query;
        None
    }

    fn collect_column_state(&self, column: &ColumnConfig, state: &mut ColumnState) {
        let _ = (column, state);
    }

    fn apply_column_state(&mut self, column: &mut ColumnConfig, state: &ColumnState) {
        let _ = (column, state);
    }

    fn reset_column_state(&mut self, column: &mut ColumnConfig) {
        let _ = column;
    }
}

use std::sync::Arc;

use datagrid_virtual::{Align, RowRange};
use serde_json::Value;

use super::{PluginEvent, PluginManager, PluginQuery};
use crate::grid::{self, GridCore, RowAnimationKind};
use crate::{ColumnConfig, ConfigManager, GridRow, RenderPhase, RowId, SortDirection};

/// The grid as seen from inside a plugin hook.
///
/// Everything a plugin observes or changes goes through this reference, so plugins always see
/// the same rows and configuration the grid renders.
pub struct GridRef<'a, R> {
    core: &'a mut GridCore<R>,
    plugins: &'a mut PluginManager<R>,
    plugin: Arc<str>,
}

impl<'a, R> GridRef<'a, R> {
    pub(crate) fn new(
        core: &'a mut GridCore<R>,
        plugins: &'a mut PluginManager<R>,
        plugin: Arc<str>,
    ) -> Self {
        Self {
            core,
            plugins,
            plugin,
        }
    }

    /// Name of the plugin this reference was handed to.
    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    /// Timestamp of the current frame.
    pub fn now_ms(&self) -> u64 {
        self.core.now_ms
    }

    pub fn rows(&self) -> &[Arc<R>] {
        self.core.rows.source()
    }

    pub fn display_rows(&self) -> &[Arc<R>] {
        self.core.rows.display()
    }

    pub fn row(&self, id: &RowId) -> Option<&Arc<R>> {
        self.core.rows.get(id)
    }

    pub fn row_id(&self, display_index: usize) -> Option<&RowId> {
        self.core.rows.display_ids().get(display_index)
    }

    pub fn row_index(&self, id: &RowId) -> Option<usize> {
        self.core.rows.display_index(id)
    }

    pub fn config(&self) -> &ConfigManager {
        &self.core.config
    }

    /// Raw access to the configuration. Changes made here need a matching
    /// [`request_render`](Self::request_render).
    pub fn config_mut(&mut self) -> &mut ConfigManager {
        &mut self.core.config
    }

    pub fn columns(&self) -> &[ColumnConfig] {
        self.core.config.columns()
    }

    pub fn visible_range(&self) -> RowRange {
        self.core.body.rows().visible_range()
    }

    pub fn request_render(&mut self, phase: RenderPhase) {
        self.core.scheduler.request(phase);
    }

    /// Re-renders one row's surface on the next frame, if it is materialized.
    pub fn refresh_row(&mut self, id: &RowId) -> bool {
        self.core.invalidate_row(id)
    }

    pub fn animate_row(&mut self, id: &RowId, kind: RowAnimationKind) -> bool {
        let now = self.core.now_ms;
        self.core.animate_row(id, kind, now)
    }

    pub fn scroll_to_row(&mut self, id: &RowId, align: Align) -> bool {
        let now = self.core.now_ms;
        self.core.scroll_to_row(id, align, now)
    }

    /// Subscribes the calling plugin to `kind`. Returns `false` if it already was.
    pub fn on(&mut self, kind: &str) -> bool {
        self.plugins.subscribe(&self.plugin, kind)
    }

    /// Removes only the calling plugin's subscription to `kind`.
    pub fn off(&mut self, kind: &str) -> bool {
        self.plugins.unsubscribe(&self.plugin, kind)
    }
}

impl<R: GridRow + 'static> GridRef<'_, R> {
    /// Emits an event on behalf of the calling plugin. Delivery is synchronous; the caller is
    /// not re-entered.
    pub fn emit(&mut self, kind: impl Into<String>, detail: Value) {
        let mut event = PluginEvent::new(kind, detail);
        event.source = Some(self.plugin.to_string());
        grid::emit(self.core, self.plugins, event);
    }

    pub fn query(&mut self, kind: impl Into<String>, context: Value) -> Vec<Value> {
        self.plugins
            .query(self.core, &PluginQuery::new(kind, context))
    }

    pub fn set_column_visible(&mut self, field: &str, visible: bool) -> bool {
        grid::set_column_visible(self.core, self.plugins, field, visible)
    }

    pub fn set_column_width(&mut self, field: &str, width: u32) -> bool {
        grid::set_column_width(self.core, self.plugins, field, width)
    }

    pub fn move_column(&mut self, field: &str, to: usize) -> bool {
        grid::move_column(self.core, self.plugins, field, to)
    }

    pub fn set_sort(&mut self, field: &str, direction: Option<SortDirection>) -> bool {
        grid::set_sort(self.core, self.plugins, field, direction)
    }

    pub fn toggle_sort(&mut self, field: &str) -> Option<SortDirection> {
        grid::toggle_sort(self.core, self.plugins, field)
    }
}

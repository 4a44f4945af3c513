mod inner;
mod rows;

pub use inner::{RowAnimation, RowAnimationKind};
pub(crate) use inner::{
    GridCore, collect_state, emit, move_column, render_surfaces, set_column_visible,
    set_column_width, set_sort, toggle_sort,
};

use std::sync::Arc;

use datagrid_scroll::{Easing, ScrollController};
use datagrid_virtual::{Align, ReconcileStats, RowRange, ViewportRect, VirtualWindow};
use serde_json::Value;
use tracing::{debug, trace};

use crate::plugin::PluginManager;
use crate::{
    ColumnConfig, ColumnsSource, ConfigManager, EditOn, FeatureRegistry, FitMode, GridConfig,
    GridError, GridOptions, GridRow, GridState, KeyEvent, Plugin, PluginError, PluginEvent,
    PluginQuery, RenderPhase, Result, RowId, RowSurface, SortDirection,
};

/// What one [`Grid::frame`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// The coalesced phase that ran, or `None` when nothing was pending.
    pub phase: Option<RenderPhase>,
    /// Materialized row range (visible rows plus overscan).
    pub window: RowRange,
    pub reconcile: ReconcileStats,
    /// Surfaces whose cells were rendered this frame.
    pub rendered_rows: usize,
    /// A debounced state-change notification fired this frame.
    pub state_changed: bool,
}

/// A data grid: configuration, rows, plugins and the virtualized body.
///
/// Mutations only mark work as pending. [`frame`](Self::frame), called from the host's
/// animation-frame callback, runs one coalesced render pass.
pub struct Grid<R> {
    core: GridCore<R>,
    plugins: PluginManager<R>,
    features: FeatureRegistry<R>,
}

impl<R: GridRow + 'static> Grid<R> {
    pub fn new(options: GridOptions) -> Self {
        Self::with_features(options, FeatureRegistry::new())
    }

    /// A grid that can enable features from `features` by name.
    pub fn with_features(options: GridOptions, features: FeatureRegistry<R>) -> Self {
        Self {
            core: GridCore::new(options),
            plugins: PluginManager::default(),
            features,
        }
    }

    /// Identifies rows so measurements, surfaces and anchors follow them across replacement.
    /// Without it a row's id is its source position.
    pub fn with_row_identity(
        mut self,
        identity: impl Fn(&R) -> Option<RowId> + Send + Sync + 'static,
    ) -> Self {
        self.core.rows.set_identity(Arc::new(identity));
        self
    }

    pub fn options(&self) -> &GridOptions {
        &self.core.options
    }

    pub fn features(&self) -> &FeatureRegistry<R> {
        &self.features
    }

    pub fn config(&self) -> &ConfigManager {
        &self.core.config
    }

    pub fn effective_config(&self) -> &GridConfig {
        self.core.config.effective()
    }

    pub fn columns(&self) -> &[ColumnConfig] {
        self.core.config.columns()
    }

    /// Changes configuration sources through `f` and schedules a full pass.
    pub fn configure(&mut self, f: impl FnOnce(&mut ConfigManager)) {
        f(&mut self.core.config);
        self.core.scheduler.request(RenderPhase::Full);
    }

    pub fn set_grid_config(&mut self, config: GridConfig) {
        self.configure(|c| c.set_grid_config(config));
    }

    pub fn set_columns(&mut self, columns: impl Into<ColumnsSource>) {
        self.configure(|c| c.set_columns(columns));
    }

    pub fn set_structural_columns(&mut self, columns: Vec<ColumnConfig>) {
        self.configure(|c| c.set_structural_columns(columns));
    }

    /// Feeds the structural watcher; the merge runs once declarations settle.
    pub fn observe_structural_columns(&mut self, columns: Vec<ColumnConfig>, now_ms: u64) {
        self.core.config.observe_structural_columns(columns, now_ms);
    }

    pub fn set_fit_mode(&mut self, mode: FitMode) {
        self.configure(|c| c.set_fit_mode(mode));
    }

    pub fn set_edit_on(&mut self, edit_on: EditOn) {
        self.configure(|c| c.set_edit_on(edit_on));
    }

    /// Runs a merge now instead of waiting for the next frame.
    pub fn merge(&mut self) -> bool {
        self.core.merge()
    }

    /// Replaces the rows. Rejected as a whole, keeping the previous rows, when the identity
    /// function panics, yields no id or yields a duplicate.
    pub fn set_rows(&mut self, rows: impl IntoIterator<Item = R>) -> Result<()> {
        self.set_shared_rows(rows.into_iter().map(Arc::new).collect())
    }

    pub fn set_shared_rows(&mut self, rows: Vec<Arc<R>>) -> Result<()> {
        let count = rows.len();
        self.core.rows.replace(rows)?;
        self.core.rows_replaced = true;
        debug!(target: "datagrid::render", count, "rows replaced");
        let phase = if self.core.config.columns().is_empty() {
            RenderPhase::Full
        } else {
            RenderPhase::Rows
        };
        self.core.scheduler.request(phase);
        Ok(())
    }

    pub fn rows(&self) -> &[Arc<R>] {
        self.core.rows.source()
    }

    /// Rows after plugin processing, in display order.
    pub fn display_rows(&self) -> &[Arc<R>] {
        self.core.rows.display()
    }

    pub fn row(&self, id: &RowId) -> Option<&Arc<R>> {
        self.core.rows.get(id)
    }

    pub fn row_index(&self, id: &RowId) -> Option<usize> {
        self.core.rows.display_index(id)
    }

    pub fn set_column_visible(&mut self, field: &str, visible: bool) -> bool {
        set_column_visible(&mut self.core, &mut self.plugins, field, visible)
    }

    pub fn set_column_width(&mut self, field: &str, width: u32) -> bool {
        set_column_width(&mut self.core, &mut self.plugins, field, width)
    }

    pub fn move_column(&mut self, field: &str, to: usize) -> bool {
        move_column(&mut self.core, &mut self.plugins, field, to)
    }

    pub fn set_sort(&mut self, field: &str, direction: Option<SortDirection>) -> bool {
        set_sort(&mut self.core, &mut self.plugins, field, direction)
    }

    pub fn toggle_sort(&mut self, field: &str) -> Option<SortDirection> {
        toggle_sort(&mut self.core, &mut self.plugins, field)
    }

    pub fn report_rendered_width(&mut self, field: &str, width: u32) {
        self.core.config.report_rendered_width(field, width);
    }

    pub fn collect_state(&self) -> GridState {
        collect_state(&self.core, &self.plugins)
    }

    pub fn apply_state(&mut self, state: &GridState) {
        let plugins = &mut self.plugins;
        self.core
            .config
            .apply_state(state, |column, s| plugins.apply_column_state(column, s));
        self.core.pool.clear();
        self.core.scheduler.request(RenderPhase::Columns);
    }

    pub fn reset_state(&mut self) {
        let plugins = &mut self.plugins;
        self.core
            .config
            .reset_state(|column| plugins.reset_column_state(column));
        self.core.pool.clear();
        self.core.scheduler.request(RenderPhase::Columns);
    }

    pub fn body(&self) -> &ScrollController<RowId> {
        &self.core.body
    }

    pub fn set_viewport(&mut self, viewport: ViewportRect) {
        self.core.body.rows_mut().set_viewport(viewport);
        self.core.scheduler.request(RenderPhase::Virtualization);
    }

    pub fn scroll_offset(&self) -> u64 {
        self.core.body.rows().scroll_offset()
    }

    /// A scroll reported by the host. Cancels any tween or momentum.
    pub fn on_scroll(&mut self, offset: u64, now_ms: u64) {
        self.core.body.on_scroll(offset, now_ms);
        self.core.scheduler.request(RenderPhase::Virtualization);
    }

    pub fn touch_start(&mut self, y: f32, now_ms: u64) {
        self.core.body.touch_start(y, now_ms);
    }

    pub fn touch_move(&mut self, y: f32, now_ms: u64) -> u64 {
        self.core.scheduler.request(RenderPhase::Virtualization);
        self.core.body.touch_move(y, now_ms)
    }

    /// Returns `true` when the release starts momentum scrolling.
    pub fn touch_end(&mut self, now_ms: u64) -> bool {
        self.core.body.touch_end(now_ms)
    }

    pub fn stop_momentum(&mut self) {
        self.core.body.cancel_motion();
    }

    pub fn scroll_to_row(&mut self, id: &RowId, align: Align, now_ms: u64) -> bool {
        self.core.scroll_to_row(id, align, now_ms)
    }

    /// Starts a smooth scroll to `id`, driven by subsequent frames.
    pub fn smooth_scroll_to_row(
        &mut self,
        id: &RowId,
        align: Align,
        now_ms: u64,
        duration_ms: u64,
    ) -> bool {
        let Some(index) = self.core.rows.display_index(id) else {
            return false;
        };
        self.core
            .body
            .start_tween_to_index(index, align, now_ms, duration_ms, Easing::EaseInOutCubic);
        self.core.scheduler.request(RenderPhase::Virtualization);
        true
    }

    /// Records a measured row height. Rows starting above the scroll offset shift it so the
    /// content in view stays put.
    pub fn measure_row(&mut self, id: &RowId, height: u32) -> bool {
        let Some(index) = self.core.rows.display_index(id) else {
            return false;
        };
        let shift = self.core.body.rows_mut().resize_row(index, height);
        trace!(target: "datagrid::render", %id, height, shift, "measure_row");
        self.core.scheduler.request(RenderPhase::Virtualization);
        true
    }

    pub fn measure_rows<'a>(
        &mut self,
        measurements: impl IntoIterator<Item = (&'a RowId, u32)>,
    ) -> usize {
        let rows = &self.core.rows;
        let resolved: Vec<(usize, u32)> = measurements
            .into_iter()
            .filter_map(|(id, h)| rows.display_index(id).map(|i| (i, h)))
            .collect();
        let count = resolved.len();
        self.core.body.rows_mut().resize_many(resolved);
        self.core.scheduler.request(RenderPhase::Virtualization);
        count
    }

    /// Starts a row animation. Fails for unknown rows and when animations are off.
    pub fn animate_row(&mut self, id: &RowId, kind: RowAnimationKind, now_ms: u64) -> bool {
        self.core.animate_row(id, kind, now_ms)
    }

    pub fn row_animation(&self, id: &RowId) -> Option<&RowAnimation> {
        self.core.animations.iter().find(|a| &a.id == id)
    }

    pub fn request_render(&mut self, phase: RenderPhase) {
        self.core.scheduler.request(phase);
    }

    pub fn pending_render(&self) -> Option<RenderPhase> {
        self.core.scheduler.pending()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.core.scheduler.frames_rendered()
    }

    /// Pooled surfaces in row order, one per materialized row.
    pub fn surfaces(&self) -> impl Iterator<Item = &RowSurface> {
        self.core.pool.iter()
    }

    pub fn surface(&self, id: &RowId) -> Option<&RowSurface> {
        self.core.pool.get(id)
    }

    pub fn surface_count(&self) -> usize {
        self.core.pool.len()
    }

    pub fn window(&self) -> VirtualWindow<RowId> {
        self.core.body.rows().window()
    }

    /// Runs one frame: structural watcher, motion, animation expiry, then the coalesced render
    /// pass (merge, column setup, row processing, window and cells), then the debounced
    /// state-change notification.
    pub fn frame(&mut self, now_ms: u64) -> FrameReport {
        let core = &mut self.core;
        let plugins = &mut self.plugins;
        core.now_ms = now_ms;

        if core.config.poll_structural(now_ms) {
            core.scheduler.request(RenderPhase::Full);
        }
        if core.body.tick(now_ms).is_some() {
            core.scheduler.request(RenderPhase::Virtualization);
        }
        core.expire_animations(now_ms);

        let mut report = FrameReport {
            phase: core.scheduler.begin_frame(),
            ..FrameReport::default()
        };
        if let Some(phase) = report.phase {
            if phase >= RenderPhase::Full {
                core.merge();
            }
            if phase >= RenderPhase::Columns {
                core.pool.invalidate_all();
            }
            if phase >= RenderPhase::Rows {
                let source = core.rows.source().to_vec();
                let display = plugins.process_rows(core, source);
                core.rows.set_display(display);
                core.sync_row_keys();
                core.pool.invalidate_all();
            }

            let window = core.body.rows().window();
            report.window = window.range;
            report.reconcile = core.pool.reconcile(&window.rows);
            report.rendered_rows = render_surfaces(core, plugins);
            plugins.after_render(core);
            trace!(
                target: "datagrid::render",
                ?phase,
                start = window.range.start,
                end = window.range.end,
                rendered = report.rendered_rows,
                "frame"
            );
        }

        if core.config.poll_state_change(now_ms) {
            let state = collect_state(core, plugins);
            let detail = serde_json::to_value(&state).unwrap_or_default();
            emit(core, plugins, PluginEvent::new("column-state-change", detail));
            report.state_changed = true;
        }
        report
    }

    pub fn attach(
        &mut self,
        plugin: impl Plugin<R> + 'static,
    ) -> std::result::Result<(), PluginError> {
        self.attach_boxed(Box::new(plugin))
    }

    /// Attaches a plugin after checking its required dependencies are attached.
    pub fn attach_boxed(
        &mut self,
        plugin: Box<dyn Plugin<R>>,
    ) -> std::result::Result<(), PluginError> {
        self.plugins.attach(&mut self.core, plugin)
    }

    /// Detaches a plugin and drops every subscription it held. Refused while another attached
    /// plugin requires it.
    pub fn detach(&mut self, name: &str) -> std::result::Result<Box<dyn Plugin<R>>, PluginError> {
        self.plugins.detach(&mut self.core, name)
    }

    /// Creates the named feature from the registry and attaches it.
    pub fn enable_feature(&mut self, name: &str) -> Result<()> {
        let plugin = self
            .features
            .create(name)
            .ok_or_else(|| GridError::UnknownFeature(name.to_owned()))?;
        self.attach_boxed(plugin)?;
        Ok(())
    }

    pub fn plugins(&self) -> &PluginManager<R> {
        &self.plugins
    }

    pub fn emit_plugin_event(&mut self, kind: impl Into<String>, detail: Value) {
        emit(&mut self.core, &mut self.plugins, PluginEvent::new(kind, detail));
    }

    pub fn query_plugins(&mut self, kind: impl Into<String>, context: Value) -> Vec<Value> {
        self.plugins
            .query(&mut self.core, &PluginQuery::new(kind, context))
    }

    /// Offers a key event to plugins; `true` when one handled it.
    pub fn handle_key_down(&mut self, event: &KeyEvent) -> bool {
        self.plugins.key_down(&mut self.core, event)
    }
}

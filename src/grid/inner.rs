use std::sync::Arc;

use datagrid_scroll::{Easing, ScrollController, Tween, apply_anchor};
use datagrid_virtual::{Align, SurfacePool, VirtualRowsOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};

use super::rows::RowStore;
use crate::plugin::PluginManager;
use crate::render::render_cell;
use crate::{
    CellRenderContext, ConfigManager, GridOptions, GridRow, GridState, PluginEvent, PluginQuery,
    RenderPhase, RenderScheduler, RowContent, RowId, SortDirection,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowAnimationKind {
    Change,
    Insert,
    Remove,
}

/// A timed animation on one row.
#[derive(Clone, Debug, PartialEq)]
pub struct RowAnimation {
    pub id: RowId,
    pub kind: RowAnimationKind,
    tween: Tween,
}

impl RowAnimation {
    /// Eased progress in `[0, 1]`.
    pub fn progress(&self, now_ms: u64) -> f32 {
        self.tween.easing.sample(self.tween.progress(now_ms))
    }

    pub fn duration_ms(&self) -> u64 {
        self.tween.duration_ms
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        self.tween.is_done(now_ms)
    }
}

/// Grid state shared with plugins through [`GridRef`](crate::GridRef).
pub(crate) struct GridCore<R> {
    pub(crate) options: GridOptions,
    pub(crate) config: ConfigManager,
    pub(crate) rows: RowStore<R>,
    pub(crate) body: ScrollController<RowId>,
    pub(crate) pool: SurfacePool<RowId, RowContent>,
    pub(crate) scheduler: RenderScheduler,
    pub(crate) animations: Vec<RowAnimation>,
    pub(crate) now_ms: u64,
    /// Source rows were replaced since the last row pass; the next one re-anchors the viewport.
    pub(crate) rows_replaced: bool,
    estimate: u32,
}

impl<R> GridCore<R> {
    pub(crate) fn new(options: GridOptions) -> Self {
        let estimate = options.default_row_height.max(options.min_row_height);
        let body = VirtualRowsOptions::new_keyed(0, move |_| estimate, |i| RowId::Index(i as u64))
            .with_overscan(options.overscan)
            .with_min_row_height(options.min_row_height)
            .with_is_scrolling_reset_delay_ms(options.scroll_reset_delay_ms);
        Self {
            config: ConfigManager::new(&options),
            rows: RowStore::default(),
            body: ScrollController::new(body).with_momentum(options.momentum),
            pool: SurfacePool::new(),
            scheduler: RenderScheduler::new(),
            animations: Vec::new(),
            now_ms: 0,
            rows_replaced: false,
            estimate,
            options,
        }
    }

    /// Points the row estimate at the effective row height.
    pub(crate) fn sync_row_estimate(&mut self) {
        let estimate = self.config.row_height().max(self.options.min_row_height);
        if estimate == self.estimate {
            return;
        }
        self.estimate = estimate;
        self.body
            .rows_mut()
            .update_options(|o| o.estimate_height = Arc::new(move |_| estimate));
    }

    /// Pushes the display ids into the row engine. After a data replacement the first visible
    /// row stays in place; a reorder by plugins keeps the scroll offset. Motion is not cancelled.
    pub(crate) fn sync_row_keys(&mut self) {
        let anchor = if std::mem::take(&mut self.rows_replaced) {
            self.body.capture_first_visible_anchor()
        } else {
            None
        };
        let ids = Arc::clone(self.rows.display_ids());
        let count = ids.len();
        self.body.rows_mut().set_row_keys(count, move |i| {
            ids.get(i).cloned().unwrap_or(RowId::Index(i as u64))
        });
        if let Some(anchor) = anchor {
            let rows = &self.rows;
            let kept = apply_anchor(self.body.rows_mut(), &anchor, |id| rows.display_index(id));
            trace!(target: "datagrid::render", kept, "row anchor");
        }
        let max = self.body.rows().max_scroll_offset();
        if self.body.rows().scroll_offset() > max {
            self.body.rows_mut().set_scroll_offset(max);
        }
    }

    pub(crate) fn invalidate_row(&mut self, id: &RowId) -> bool {
        let found = self.pool.invalidate(id);
        if found {
            self.scheduler.request(RenderPhase::Virtualization);
        }
        found
    }

    pub(crate) fn animate_row(&mut self, id: &RowId, kind: RowAnimationKind, now_ms: u64) -> bool {
        if !self.rows.contains(id) {
            debug!(target: "datagrid::render", %id, "animate_row: unknown row");
            return false;
        }
        let Some(duration) = self.config.effective().row_animation_ms() else {
            return false;
        };
        self.animations.retain(|a| &a.id != id);
        self.animations.push(RowAnimation {
            id: id.clone(),
            kind,
            tween: Tween::new(0, 1, now_ms, duration, Easing::EaseOutCubic),
        });
        self.pool.invalidate(id);
        self.scheduler.request(RenderPhase::Virtualization);
        true
    }

    pub(crate) fn expire_animations(&mut self, now_ms: u64) {
        let before = self.animations.len();
        let (done, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.animations)
            .into_iter()
            .partition(|a| a.is_done(now_ms));
        self.animations = live;
        for a in &done {
            self.pool.invalidate(&a.id);
        }
        if self.animations.len() != before {
            self.scheduler.request(RenderPhase::Virtualization);
        }
    }

    pub(crate) fn scroll_to_row(&mut self, id: &RowId, align: Align, now_ms: u64) -> bool {
        let Some(index) = self.rows.display_index(id) else {
            return false;
        };
        self.body.scroll_to_index(index, align, now_ms);
        self.scheduler.request(RenderPhase::Virtualization);
        true
    }
}

impl<R: GridRow> GridCore<R> {
    pub(crate) fn merge(&mut self) -> bool {
        let first = self.rows.first().cloned();
        let merged = self
            .config
            .merge(first.as_deref().map(|row| row as &dyn GridRow));
        if merged {
            self.pool.clear();
            self.sync_row_estimate();
        }
        merged
    }
}

pub(crate) fn emit<R: GridRow + 'static>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
    event: PluginEvent,
) {
    trace!(target: "datagrid::plugin", event = %event.kind, "emit");
    plugins.emit(core, &event);
}

pub(crate) fn set_column_visible<R: GridRow + 'static>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
    field: &str,
    visible: bool,
) -> bool {
    if !core.config.set_column_visible(field, visible) {
        return false;
    }
    core.pool.clear();
    core.scheduler.request(RenderPhase::Columns);
    let fields = core.config.visible_fields();
    emit(
        core,
        plugins,
        PluginEvent::new(
            "column-visibility",
            json!({ "field": field, "visible": visible, "visibleFields": fields }),
        ),
    );
    true
}

pub(crate) fn set_column_width<R: GridRow + 'static>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
    field: &str,
    width: u32,
) -> bool {
    if !core.config.set_column_width(field, width) {
        return false;
    }
    core.scheduler.request(RenderPhase::Columns);
    let width = core.config.column(field).and_then(|c| c.width);
    emit(
        core,
        plugins,
        PluginEvent::new("column-resize", json!({ "field": field, "width": width })),
    );
    true
}

/// Moves a column unless a plugin answers `can-move-column` with `false`.
pub(crate) fn move_column<R: GridRow + 'static>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
    field: &str,
    to: usize,
) -> bool {
    let query = PluginQuery::new("can-move-column", json!({ "field": field, "to": to }));
    if plugins
        .query(core, &query)
        .iter()
        .any(|answer| answer.as_bool() == Some(false))
    {
        debug!(target: "datagrid::config", field, to, "column move vetoed");
        return false;
    }
    if !core.config.move_column(field, to) {
        return false;
    }
    core.scheduler.request(RenderPhase::Columns);
    emit(
        core,
        plugins,
        PluginEvent::new("column-move", json!({ "field": field, "to": to })),
    );
    true
}

pub(crate) fn set_sort<R: GridRow + 'static>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
    field: &str,
    direction: Option<SortDirection>,
) -> bool {
    if !core.config.set_sort(field, direction) {
        return false;
    }
    sort_changed(core, plugins);
    true
}

pub(crate) fn toggle_sort<R: GridRow + 'static>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
    field: &str,
) -> Option<SortDirection> {
    let before = core.config.sort_model().cloned();
    let next = core.config.toggle_sort(field);
    if core.config.sort_model() != before.as_ref() {
        sort_changed(core, plugins);
    }
    next
}

fn sort_changed<R: GridRow + 'static>(core: &mut GridCore<R>, plugins: &mut PluginManager<R>) {
    core.scheduler.request(RenderPhase::Rows);
    let detail = serde_json::to_value(core.config.sort_model()).unwrap_or_default();
    emit(core, plugins, PluginEvent::new("sort-change", detail));
}

pub(crate) fn collect_state<R>(core: &GridCore<R>, plugins: &PluginManager<R>) -> GridState {
    core.config
        .collect_state(|column, state| plugins.collect_column_state(column, state))
}

/// Renders every surface marked stale and runs `after_cell_render` on its cells.
pub(crate) fn render_surfaces<R: GridRow>(
    core: &mut GridCore<R>,
    plugins: &mut PluginManager<R>,
) -> usize {
    let GridCore {
        config,
        rows,
        pool,
        animations,
        ..
    } = core;
    let columns: Vec<_> = config
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_visible())
        .collect();

    let mut rendered = 0;
    for surface in pool.iter_mut() {
        if !surface.needs_render() {
            continue;
        }
        let index = surface.index();
        let Some(row) = rows.display().get(index) else {
            continue;
        };
        let id = surface.key().clone();
        let mut cells = Vec::with_capacity(columns.len());
        for &(column_index, column) in &columns {
            let mut cell = render_cell(row.as_ref(), column);
            plugins.after_cell_render(&mut CellRenderContext {
                row: row.as_ref(),
                row_id: &id,
                row_index: index,
                column,
                column_index,
                cell: &mut cell,
            });
            cells.push(cell);
        }
        let content = surface.content_mut();
        content.cells = cells;
        content.animation = animations.iter().find(|a| a.id == id).map(|a| a.kind);
        surface.mark_rendered();
        rendered += 1;
    }
    rendered
}
